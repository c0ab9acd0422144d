use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::model::User;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for `subject` issued at `issued_at`, valid for `expires_in_seconds`.
    pub fn new(subject: String, issued_at: DateTime<Utc>, expires_in_seconds: i64) -> Self {
        let expiration = issued_at + Duration::seconds(expires_in_seconds);

        Self {
            sub: subject,
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Expired from the `exp` second onwards; there is no leeway.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Sign `claims` with `secret` (HS256).
pub fn generate_token(claims: &Claims, secret: &str) -> Result<String> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
}

/// Check the signature of `token` and return its claims.
///
/// Expiry is not checked here; see [`Claims::is_expired_at`].
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            warn!(error = %e, "rejected session token");
            AuthError::InvalidToken
        })
}

/// Issues and verifies bearer session tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_seconds: i64,
}

impl TokenService {
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `ttl_seconds` - Token lifetime in seconds (e.g. 3600 for 1 hour)
    pub fn new(secret: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        if user.id.is_empty() {
            return Err(AuthError::TokenGenerationError("User has no ID".to_string()));
        }
        generate_token(&Claims::new(user.id.clone(), now, self.ttl_seconds), &self.secret)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Every failure (malformed, bad signature, expired) is `InvalidToken`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let claims = validate_token(token, &self.secret)?;
        if claims.is_expired_at(now) {
            warn!(sub = %claims.sub, "rejected expired session token");
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
