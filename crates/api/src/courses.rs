use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use query::{ResultEnvelope, advanced_results, translate};
use serde_json::{Value, json};
use std::sync::Arc;
use storage::{CollectionStore, CollectionStoreExt, Document, Filter};
use tracing::info;

use crate::AppState;
use crate::aggregates::refresh_average_cost;
use crate::bootcamps::find_bootcamp;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthUser, JsonBody};
use crate::resources::{COURSES, PARENT_BOOTCAMP};
use auth::Role;

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("No course found with id of {id}"))
}

async fn find_course(store: &dyn CollectionStore, id: &str) -> ApiResult<Document> {
    store
        .find_by_id(COURSES.collection, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn bootcamp_of(course: &Document) -> Option<String> {
    course.get("bootcamp").and_then(Value::as_str).map(str::to_string)
}

/// GET /courses
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ResultEnvelope<Vec<Document>>>> {
    let spec = translate(&params, &COURSES)?;
    let envelope = advanced_results(state.store.as_ref(), &COURSES, &spec).await?;
    Ok(Json(envelope))
}

/// GET /bootcamps/{bootcampId}/courses
pub async fn list_for_bootcamp(
    State(state): State<Arc<AppState>>,
    Path(bootcamp_id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Vec<Document>>>> {
    let courses = state
        .store
        .find(COURSES.collection, Filter::eq("bootcamp", bootcamp_id))
        .exec()
        .await?;
    Ok(Json(ResultEnvelope::list(courses)))
}

/// GET /courses/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Document>>> {
    let course = state
        .store
        .find(COURSES.collection, Filter::eq("id", id.as_str()))
        .populate(PARENT_BOOTCAMP)
        .first()
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(ResultEnvelope::single(course)))
}

/// POST /bootcamps/{bootcampId}/courses
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(bootcamp_id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<(StatusCode, Json<ResultEnvelope<Document>>)> {
    user.authorize(&[Role::Publisher, Role::Admin])?;

    let bootcamp = find_bootcamp(state.store.as_ref(), &bootcamp_id).await?;
    user.ensure_owner(&bootcamp, &format!("add a course to bootcamp {bootcamp_id}"))?;

    let mut document = COURSES.writable(&body);
    document.insert("bootcamp".to_string(), Value::String(bootcamp_id.clone()));
    document.insert("user".to_string(), Value::String(user.id().to_string()));

    let course = state.store.insert(COURSES.collection, document).await?;
    refresh_average_cost(state.store.as_ref(), &bootcamp_id).await?;
    info!(bootcamp_id = %bootcamp_id, user_id = %user.id(), "added course");

    Ok((StatusCode::CREATED, Json(ResultEnvelope::single(course))))
}

/// PUT /courses/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<Json<ResultEnvelope<Document>>> {
    let course = find_course(state.store.as_ref(), &id).await?;
    user.ensure_owner(&course, &format!("update course {id}"))?;

    let updated = state
        .store
        .update(COURSES.collection, &id, COURSES.writable(&body))
        .await?
        .ok_or_else(|| not_found(&id))?;
    if let Some(bootcamp_id) = bootcamp_of(&updated) {
        refresh_average_cost(state.store.as_ref(), &bootcamp_id).await?;
    }

    Ok(Json(ResultEnvelope::single(updated)))
}

/// DELETE /courses/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Value>>> {
    let course = find_course(state.store.as_ref(), &id).await?;
    user.ensure_owner(&course, &format!("delete course {id}"))?;

    state.store.delete(COURSES.collection, &id).await?;
    if let Some(bootcamp_id) = bootcamp_of(&course) {
        refresh_average_cost(state.store.as_ref(), &bootcamp_id).await?;
    }
    info!(course_id = %id, user_id = %user.id(), "deleted course");

    Ok(Json(ResultEnvelope::single(json!({}))))
}
