use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{
    AppState, auth_handlers, bootcamps, courses, middleware as guard, reviews, users,
};
use auth::Role;

pub fn router(state: Arc<AppState>) -> Router {
    let bootcamp_routes = Router::new()
        .route("/bootcamps", get(bootcamps::list).post(bootcamps::create))
        .route(
            "/bootcamps/{id}",
            get(bootcamps::get).put(bootcamps::update).delete(bootcamps::delete),
        )
        .route(
            "/bootcamps/{id}/courses",
            get(courses::list_for_bootcamp).post(courses::create),
        )
        .route(
            "/bootcamps/{id}/reviews",
            get(reviews::list_for_bootcamp).post(reviews::create),
        );

    let course_routes = Router::new()
        .route("/courses", get(courses::list))
        .route(
            "/courses/{id}",
            get(courses::get).put(courses::update).delete(courses::delete),
        );

    let review_routes = Router::new()
        .route("/reviews", get(reviews::list))
        .route(
            "/reviews/{id}",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        );

    let auth_routes = Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", get(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::me))
        .route("/auth/updatedetails", put(auth_handlers::update_details))
        .route("/auth/updatepassword", put(auth_handlers::update_password))
        .route("/auth/forgotpassword", post(auth_handlers::forgot_password))
        .route("/auth/resetpassword/{reset_token}", put(auth_handlers::reset_password));

    // Account administration (admin only)
    let user_routes = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_roles(&[Role::Admin]),
        ));

    let api = Router::new()
        .merge(bootcamp_routes)
        .merge(course_routes)
        .merge(review_routes)
        .merge(auth_routes)
        .merge(user_routes);

    Router::new()
        .route("/", get(|| async { "DevCamper API running" }))
        .nest("/api/v1", api)
        .with_state(state)
}
