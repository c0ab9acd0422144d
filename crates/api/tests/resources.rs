mod common;

use auth::Role;
use axum::http::StatusCode;
use common::{TestApp, app};
use serde_json::{Value, json};
use storage::{CollectionStore, Filter};

async fn create_bootcamp(app: &TestApp, token: &str, name: &str) -> Value {
    let body = json!({ "name": name, "description": "Learn things", "housing": true, "averageCost": 1 });
    let (status, body) = app.post("/api/v1/bootcamps", Some(token), body).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_publisher_creates_one_bootcamp() {
    let app = app();
    let publisher = app.register("pub@example.com", Role::Publisher).await;

    let camp = create_bootcamp(&app, &publisher, "Devworks Bootcamp").await;
    assert_eq!(camp["slug"], json!("devworks-bootcamp"));
    assert!(camp.get("averageCost").is_none());
    assert!(camp["user"].is_string());

    let (status, _) = app
        .post("/api/v1/bootcamps", Some(&publisher), json!({ "name": "Second Camp" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plain_users_cannot_create_bootcamps() {
    let app = app();
    let user = app.register("user@example.com", Role::User).await;

    let (status, body) = app.post("/api/v1/bootcamps", Some(&user), json!({ "name": "Nope" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("User role user is not authorized to access this route"));

    let (status, _) = app.post("/api/v1/bootcamps", None, json!({ "name": "Nope" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_bootcamp_name_conflicts() {
    let app = app();
    let admin = app.admin_token().await;
    create_bootcamp(&app, &admin, "Devworks").await;

    let (status, _) = app.post("/api/v1/bootcamps", Some(&admin), json!({ "name": "Devworks" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_only_owner_or_admin_may_modify() {
    let app = app();
    let owner = app.register("owner@example.com", Role::Publisher).await;
    let other = app.register("other@example.com", Role::Publisher).await;
    let admin = app.admin_token().await;

    let camp = create_bootcamp(&app, &owner, "Devworks").await;
    let uri = format!("/api/v1/bootcamps/{}", camp["id"].as_str().unwrap());

    let (status, _) = app.put(&uri, Some(&other), json!({ "description": "hijacked" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.put(&uri, Some(&owner), json!({ "name": "Devworks Pro" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], json!("devworks-pro"));

    let (status, body) = app.put(&uri, Some(&admin), json!({ "phone": "555-0100" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], json!("555-0100"));
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let app = app();

    let (status, body) = app.get("/api/v1/bootcamps/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, _) = app.get("/api/v1/courses/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/reviews/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_courses_maintain_average_cost() {
    let app = app();
    let owner = app.register("owner@example.com", Role::Publisher).await;
    let other = app.register("other@example.com", Role::Publisher).await;
    let camp = create_bootcamp(&app, &owner, "Devworks").await;
    let camp_id = camp["id"].as_str().unwrap();
    let courses_uri = format!("/api/v1/bootcamps/{camp_id}/courses");

    let (status, _) = app.post(&courses_uri, Some(&other), json!({ "title": "Intruder", "tuition": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, first) = app
        .post(&courses_uri, Some(&owner), json!({ "title": "Front End", "tuition": 8000 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.post(&courses_uri, Some(&owner), json!({ "title": "Back End", "tuition": 11001 }))
        .await;

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{camp_id}"), None).await;
    assert_eq!(body["data"]["averageCost"].as_f64(), Some(9501.0));

    let (status, body) = app.get(&courses_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));

    let course_uri = format!("/api/v1/courses/{}", first["data"]["id"].as_str().unwrap());
    let (status, body) = app.get(&course_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bootcamp"]["name"], json!("Devworks"));

    let (status, _) = app.delete(&course_uri, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{camp_id}"), None).await;
    assert_eq!(body["data"]["averageCost"].as_f64(), Some(11001.0));
}

#[tokio::test]
async fn test_reviews_maintain_average_rating() {
    let app = app();
    let owner = app.register("owner@example.com", Role::Publisher).await;
    let alice = app.register("alice@example.com", Role::User).await;
    let bob = app.register("bob@example.com", Role::User).await;
    let camp = create_bootcamp(&app, &owner, "Devworks").await;
    let camp_id = camp["id"].as_str().unwrap();
    let reviews_uri = format!("/api/v1/bootcamps/{camp_id}/reviews");

    let (status, _) = app.post(&reviews_uri, Some(&owner), json!({ "title": "Mine", "rating": 10 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, review) = app.post(&reviews_uri, Some(&alice), json!({ "title": "Great", "rating": 8 })).await;
    assert_eq!(status, StatusCode::CREATED);
    app.post(&reviews_uri, Some(&bob), json!({ "title": "Good", "rating": 7 })).await;

    let (status, _) = app.post(&reviews_uri, Some(&alice), json!({ "title": "Again", "rating": 1 })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{camp_id}"), None).await;
    assert_eq!(body["data"]["averageRating"].as_f64(), Some(7.5));

    let review_uri = format!("/api/v1/reviews/{}", review["data"]["id"].as_str().unwrap());
    let (status, _) = app.put(&review_uri, Some(&bob), json!({ "rating": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.put(&review_uri, Some(&alice), json!({ "rating": 10 })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{camp_id}"), None).await;
    assert_eq!(body["data"]["averageRating"].as_f64(), Some(8.5));
}

#[tokio::test]
async fn test_deleting_a_bootcamp_cascades() {
    let app = app();
    let owner = app.register("owner@example.com", Role::Publisher).await;
    let alice = app.register("alice@example.com", Role::User).await;
    let camp = create_bootcamp(&app, &owner, "Devworks").await;
    let camp_id = camp["id"].as_str().unwrap();

    app.post(
        &format!("/api/v1/bootcamps/{camp_id}/courses"),
        Some(&owner),
        json!({ "title": "Front End", "tuition": 8000 }),
    )
    .await;
    app.post(
        &format!("/api/v1/bootcamps/{camp_id}/reviews"),
        Some(&alice),
        json!({ "title": "Great", "rating": 8 }),
    )
    .await;

    let (status, _) = app.delete(&format!("/api/v1/bootcamps/{camp_id}"), Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&format!("/api/v1/bootcamps/{camp_id}"), Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));

    let dependents = Filter::eq("bootcamp", camp_id);
    assert_eq!(app.store.count("courses", &dependents).await.unwrap(), 0);
    assert_eq!(app.store.count("reviews", &dependents).await.unwrap(), 0);

    let (status, _) = app.get(&format!("/api/v1/bootcamps/{camp_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = app();
    let admin = app.admin_token().await;

    let body = json!({ "name": "Pat", "email": "pat@example.com", "password": "patpass", "role": "publisher" });
    let (status, body) = app.post("/api/v1/users", Some(&admin), body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], json!("publisher"));
    let uri = format!("/api/v1/users/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app.put(&uri, Some(&admin), json!({ "role": "user", "password": "newpass1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("user"));

    let (status, _) = app
        .post("/api/v1/auth/login", None, json!({ "email": "pat@example.com", "password": "newpass1" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
