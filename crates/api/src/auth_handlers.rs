use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::HOST},
};
use auth::{Registration, Session, UserProfile};
use query::ResultEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::{AuthUser, JsonBody};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

impl From<Session> for TokenResponse {
    fn from(session: Session) -> Self {
        Self {
            success: true,
            token: session.token,
        }
    }
}

/// Scheme and host the client used, for links sent back to it.
fn public_base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(registration): JsonBody<Registration>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let session = state.auth.register(registration).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(session.into()))
}

/// GET /auth/logout
///
/// Tokens are not tracked server-side; the client discards its copy.
pub async fn logout(_user: AuthUser) -> Json<ResultEnvelope<Value>> {
    Json(ResultEnvelope::single(json!({})))
}

/// GET /auth/me
pub async fn me(user: AuthUser) -> Json<ResultEnvelope<UserProfile>> {
    Json(ResultEnvelope::single(user.0.profile()))
}

/// PUT /auth/updatedetails
pub async fn update_details(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(payload): JsonBody<UpdateDetailsRequest>,
) -> ApiResult<Json<ResultEnvelope<UserProfile>>> {
    let updated = state
        .auth
        .update_details(user.id(), payload.name.as_deref(), payload.email.as_deref())
        .await?;
    Ok(Json(ResultEnvelope::single(updated.profile())))
}

/// PUT /auth/updatepassword
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    JsonBody(payload): JsonBody<UpdatePasswordRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let session = state
        .auth
        .update_password(user.id(), &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(session.into()))
}

/// POST /auth/forgotpassword
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<ForgotPasswordRequest>,
) -> ApiResult<Json<ResultEnvelope<&'static str>>> {
    state
        .auth
        .forgot_password(&payload.email, &public_base_url(&headers))
        .await?;
    Ok(Json(ResultEnvelope::single("Email sent")))
}

/// PUT /auth/resetpassword/{resettoken}
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(reset_token): Path<String>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let session = state.auth.reset_password(&reset_token, &payload.password).await?;
    Ok(Json(session.into()))
}
