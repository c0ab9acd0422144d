//! Account administration. Every route here sits behind the admin-only layer.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use auth::{Role, UserProfile, UserUpdate};
use query::{ResultEnvelope, advanced_results, translate};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use storage::Document;
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::JsonBody;
use crate::resources::USERS;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("No user found with id of {id}"))
}

/// GET /users
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ResultEnvelope<Vec<Document>>>> {
    let spec = translate(&params, &USERS)?;
    let envelope = advanced_results(state.store.as_ref(), &USERS, &spec).await?;
    Ok(Json(envelope))
}

/// GET /users/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<UserProfile>>> {
    let user = state.auth.load_user(&id).await?.ok_or_else(|| not_found(&id))?;
    Ok(Json(ResultEnvelope::single(user.profile())))
}

/// POST /users
pub async fn create(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ResultEnvelope<UserProfile>>)> {
    let user = state
        .auth
        .create_user(&request.name, &request.email, &request.password, request.role)
        .await?;
    Ok((StatusCode::CREATED, Json(ResultEnvelope::single(user.profile()))))
}

/// PUT /users/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> ApiResult<Json<ResultEnvelope<UserProfile>>> {
    let user = state.auth.update_user(&id, update).await?.ok_or_else(|| not_found(&id))?;
    info!(user_id = %id, "user updated by admin");
    Ok(Json(ResultEnvelope::single(user.profile())))
}

/// DELETE /users/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Value>>> {
    state.auth.delete_user(&id).await?.ok_or_else(|| not_found(&id))?;
    info!(user_id = %id, "user deleted by admin");
    Ok(Json(ResultEnvelope::single(json!({}))))
}
