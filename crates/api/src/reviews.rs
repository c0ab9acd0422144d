use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use query::{ResultEnvelope, advanced_results, translate};
use serde_json::{Value, json};
use std::sync::Arc;
use storage::{CollectionStore, CollectionStoreExt, Document, Filter, StorageError};
use tracing::info;

use crate::AppState;
use crate::aggregates::refresh_average_rating;
use crate::bootcamps::find_bootcamp;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthUser, JsonBody};
use crate::resources::{PARENT_BOOTCAMP, REVIEWS};
use auth::Role;

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("No review found with id of {id}"))
}

async fn find_review(store: &dyn CollectionStore, id: &str) -> ApiResult<Document> {
    store
        .find_by_id(REVIEWS.collection, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn bootcamp_of(review: &Document) -> Option<String> {
    review.get("bootcamp").and_then(Value::as_str).map(str::to_string)
}

/// GET /reviews
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ResultEnvelope<Vec<Document>>>> {
    let spec = translate(&params, &REVIEWS)?;
    let envelope = advanced_results(state.store.as_ref(), &REVIEWS, &spec).await?;
    Ok(Json(envelope))
}

/// GET /bootcamps/{bootcampId}/reviews
pub async fn list_for_bootcamp(
    State(state): State<Arc<AppState>>,
    Path(bootcamp_id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Vec<Document>>>> {
    let reviews = state
        .store
        .find(REVIEWS.collection, Filter::eq("bootcamp", bootcamp_id))
        .exec()
        .await?;
    Ok(Json(ResultEnvelope::list(reviews)))
}

/// GET /reviews/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Document>>> {
    let review = state
        .store
        .find(REVIEWS.collection, Filter::eq("id", id.as_str()))
        .populate(PARENT_BOOTCAMP)
        .first()
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(ResultEnvelope::single(review)))
}

/// POST /bootcamps/{bootcampId}/reviews
///
/// One review per account and bootcamp.
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(bootcamp_id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<(StatusCode, Json<ResultEnvelope<Document>>)> {
    user.authorize(&[Role::User, Role::Admin])?;
    find_bootcamp(state.store.as_ref(), &bootcamp_id).await?;

    let mut document = REVIEWS.writable(&body);
    document.insert("bootcamp".to_string(), Value::String(bootcamp_id.clone()));
    document.insert("user".to_string(), Value::String(user.id().to_string()));

    let review = state
        .store
        .insert(REVIEWS.collection, document)
        .await
        .map_err(|err| match err {
            StorageError::Duplicate { .. } => {
                ApiError::Conflict("User has already reviewed this bootcamp".to_string())
            }
            other => other.into(),
        })?;
    refresh_average_rating(state.store.as_ref(), &bootcamp_id).await?;
    info!(bootcamp_id = %bootcamp_id, user_id = %user.id(), "added review");

    Ok((StatusCode::CREATED, Json(ResultEnvelope::single(review))))
}

/// PUT /reviews/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<Json<ResultEnvelope<Document>>> {
    let review = find_review(state.store.as_ref(), &id).await?;
    user.ensure_owner(&review, "update this review")?;

    let updated = state
        .store
        .update(REVIEWS.collection, &id, REVIEWS.writable(&body))
        .await?
        .ok_or_else(|| not_found(&id))?;
    if let Some(bootcamp_id) = bootcamp_of(&updated) {
        refresh_average_rating(state.store.as_ref(), &bootcamp_id).await?;
    }

    Ok(Json(ResultEnvelope::single(updated)))
}

/// DELETE /reviews/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Value>>> {
    let review = find_review(state.store.as_ref(), &id).await?;
    user.ensure_owner(&review, "delete this review")?;

    state.store.delete(REVIEWS.collection, &id).await?;
    if let Some(bootcamp_id) = bootcamp_of(&review) {
        refresh_average_rating(state.store.as_ref(), &bootcamp_id).await?;
    }
    info!(review_id = %id, user_id = %user.id(), "deleted review");

    Ok(Json(ResultEnvelope::single(json!({}))))
}
