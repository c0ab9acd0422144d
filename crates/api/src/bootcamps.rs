use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use query::{ResultEnvelope, advanced_results, translate};
use serde_json::{Value, json};
use std::sync::Arc;
use storage::{CollectionStore, Document, Filter};
use tracing::info;

use crate::AppState;
use crate::aggregates;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{AuthUser, JsonBody};
use crate::resources::BOOTCAMPS;
use auth::Role;

/// URL-safe, lowercase form of a bootcamp name.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub(crate) async fn find_bootcamp(store: &dyn CollectionStore, id: &str) -> ApiResult<Document> {
    store
        .find_by_id(BOOTCAMPS.collection, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Bootcamp not found with id of {id}")))
}

fn with_slug(mut document: Document) -> Document {
    if let Some(name) = document.get("name").and_then(Value::as_str) {
        let slug = slugify(name);
        document.insert("slug".to_string(), Value::String(slug));
    }
    document
}

/// GET /bootcamps
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ResultEnvelope<Vec<Document>>>> {
    let spec = translate(&params, &BOOTCAMPS)?;
    let envelope = advanced_results(state.store.as_ref(), &BOOTCAMPS, &spec).await?;
    Ok(Json(envelope))
}

/// GET /bootcamps/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Document>>> {
    let bootcamp = find_bootcamp(state.store.as_ref(), &id).await?;
    Ok(Json(ResultEnvelope::single(bootcamp)))
}

/// POST /bootcamps
///
/// Publishers may own a single bootcamp; admins are not limited.
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<(StatusCode, Json<ResultEnvelope<Document>>)> {
    user.authorize(&[Role::Publisher, Role::Admin])?;

    if !user.is_admin() {
        let published = state
            .store
            .count(BOOTCAMPS.collection, &Filter::eq("user", user.id()))
            .await?;
        if published > 0 {
            return Err(ApiError::Validation(format!(
                "The user with ID {} has already published a bootcamp",
                user.id()
            )));
        }
    }

    let mut document = with_slug(BOOTCAMPS.writable(&body));
    document.insert("user".to_string(), Value::String(user.id().to_string()));

    let bootcamp = state.store.insert(BOOTCAMPS.collection, document).await?;
    info!(bootcamp_id = ?bootcamp.get("id"), user_id = %user.id(), "created bootcamp");

    Ok((StatusCode::CREATED, Json(ResultEnvelope::single(bootcamp))))
}

/// PUT /bootcamps/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<Json<ResultEnvelope<Document>>> {
    let bootcamp = find_bootcamp(state.store.as_ref(), &id).await?;
    user.ensure_owner(&bootcamp, "update this bootcamp")?;

    let patch = with_slug(BOOTCAMPS.writable(&body));
    let updated = state
        .store
        .update(BOOTCAMPS.collection, &id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Bootcamp not found with id of {id}")))?;

    Ok(Json(ResultEnvelope::single(updated)))
}

/// DELETE /bootcamps/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Value>>> {
    let bootcamp = find_bootcamp(state.store.as_ref(), &id).await?;
    user.ensure_owner(&bootcamp, "delete this bootcamp")?;

    aggregates::delete_bootcamp(state.store.as_ref(), &id).await?;
    info!(bootcamp_id = %id, user_id = %user.id(), "deleted bootcamp");

    Ok(Json(ResultEnvelope::single(json!({}))))
}
