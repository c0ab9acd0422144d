use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, State, rejection::JsonRejection},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use storage::Document;
use tracing::debug;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use auth::{AuthError, Role, User};

/// Bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the request's bearer token to an account.
///
/// A missing header, any token failure and an unknown subject all produce
/// the same 401.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let token = bearer_token(headers).ok_or_else(|| {
        debug!("request without bearer token");
        ApiError::unauthorized()
    })?;

    state.auth.authenticate(token).await.map_err(|err| match err {
        AuthError::InvalidToken => ApiError::unauthorized(),
        other => other.into(),
    })
}

/// Route layer admitting only the given roles.
pub fn require_roles(
    roles: &'static [Role],
) -> impl Fn(State<Arc<AppState>>, Request, Next) -> Pin<Box<dyn Future<Output = ApiResult<Response>> + Send>> + Clone
{
    move |State(state): State<Arc<AppState>>, request: Request, next: Next| {
        Box::pin(async move {
            let user = AuthUser(authenticate(&state, request.headers()).await?);
            user.authorize(roles)?;

            Ok(next.run(request).await)
        })
    }
}

/// Extractor for the authenticated account
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == Role::Admin
    }

    /// Reject with 403 unless the account has one of `roles`.
    pub fn authorize(&self, roles: &[Role]) -> ApiResult<()> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            debug!(user_id = %self.0.id, role = %self.0.role, "role rejected");
            Err(ApiError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                self.0.role
            )))
        }
    }

    /// Reject with 403 unless the account owns `record` or is an admin.
    pub fn ensure_owner(&self, record: &Document, action: &str) -> ApiResult<()> {
        let owner = record.get("user").and_then(Value::as_str);
        if self.is_admin() || owner == Some(self.id()) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "User {} is not authorized to {action}",
                self.0.id
            )))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        authenticate(state, &parts.headers).await.map(AuthUser)
    }
}

/// JSON request body whose rejection uses the API error shape.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
