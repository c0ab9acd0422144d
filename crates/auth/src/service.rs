use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use storage::{
    CollectionStore, CollectionStoreExt, Filter, StorageError, from_document, to_document,
};
use tracing::{info, warn};

use crate::{
    error::{AuthError, Result},
    jwt::TokenService,
    mailer::{Mailer, Message},
    model::{Role, User, validate_password},
    reset::{self, ResetToken},
};

/// Collection holding accounts.
pub const USERS: &str = "users";

/// Self-service sign-up request.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Administrative changes to an account. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

/// A signed-in account and its bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Account lifecycle on top of a collection store
pub struct AuthService {
    store: Arc<dyn CollectionStore>,
    tokens: TokenService,
    mailer: Arc<dyn Mailer>,
    reset_ttl: Duration,
}

impl AuthService {
    /// Create a new AuthService
    ///
    /// # Arguments
    /// * `store` - Collection store holding the `users` collection
    /// * `tokens` - Session token issuer/verifier
    /// * `mailer` - Delivery channel for reset notifications
    pub fn new(store: Arc<dyn CollectionStore>, tokens: TokenService, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            tokens,
            mailer,
            reset_ttl: Duration::seconds(reset::DEFAULT_TTL_SECONDS),
        }
    }

    pub fn with_reset_ttl(mut self, ttl: Duration) -> Self {
        self.reset_ttl = ttl;
        self
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new account and sign it in.
    ///
    /// Admin accounts cannot be self-registered.
    pub async fn register(&self, registration: Registration) -> Result<Session> {
        if registration.role == Role::Admin {
            return Err(AuthError::Validation(format!(
                "Role {} cannot be self-assigned",
                registration.role
            )));
        }

        let user = self
            .create_user(
                &registration.name,
                &registration.email,
                &registration.password,
                registration.role,
            )
            .await?;
        self.session(user)
    }

    /// Create an account with any role.
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `email` - Unique email address
    /// * `password` - Plain text password (will be hashed)
    /// * `role` - Account role
    pub async fn create_user(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User> {
        if name.trim().is_empty() {
            return Err(AuthError::Validation("Please add a name".to_string()));
        }
        validate_email(email.trim())?;

        if self.find_by_email(email.trim()).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let user = User::new(name, email, role, password)?;
        let stored = self
            .store
            .insert(USERS, to_document(&user)?)
            .await
            .map_err(duplicate_email)?;
        let user: User = from_document(stored)?;

        info!(user_id = %user.id, role = %user.role, "created user");
        Ok(user)
    }

    /// Login with email and password
    ///
    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please provide an email and password".to_string()));
        }

        let Some(user) = self.find_by_email(email.trim()).await? else {
            warn!("login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.check_password(password)? {
            warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        self.session(user)
    }

    /// Resolve a bearer token to its account.
    ///
    /// Tokens issued before the last password change are rejected.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.tokens.verify(token)?;

        let user = self.load_user(&claims.sub).await?.ok_or(AuthError::InvalidToken)?;
        if user.is_session_stale(claims.iat) {
            warn!(user_id = %user.id, "rejected session issued before password change");
            return Err(AuthError::InvalidToken);
        }

        Ok(user)
    }

    pub async fn me(&self, id: &str) -> Result<User> {
        self.load_user(id).await?.ok_or(AuthError::UserNotFound)
    }

    /// Change name and/or email of the signed-in account.
    pub async fn update_details(&self, id: &str, name: Option<&str>, email: Option<&str>) -> Result<User> {
        let mut user = self.me(id).await?;

        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(AuthError::Validation("Please add a name".to_string()));
            }
            user.name = name.trim().to_string();
        }
        if let Some(email) = email {
            validate_email(email.trim())?;
            user.email = email.trim().to_string();
        }

        self.persist(&user).await
    }

    /// Change the password after checking the current one; returns a fresh session.
    pub async fn update_password(&self, id: &str, current: &str, new_password: &str) -> Result<Session> {
        let mut user = self.me(id).await?;

        if !user.check_password(current)? {
            warn!(user_id = %user.id, "password change with wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        user.set_password(new_password)?;
        let user = self.persist(&user).await?;

        info!(user_id = %user.id, "password updated");
        self.session(user)
    }

    /// Issue a reset token for `email` and mail its redemption link.
    ///
    /// When delivery fails the stored reset fields are cleared again.
    pub async fn forgot_password(&self, email: &str, base_url: &str) -> Result<()> {
        let mut user = self
            .find_by_email(email.trim())
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        let reset = ResetToken::generate(self.reset_ttl);
        user.reset_password_token = Some(reset.digest.clone());
        user.reset_password_expire = Some(reset.expires_at);
        let mut user = self.persist(&user).await?;

        let url = format!(
            "{}/api/v1/auth/resetpassword/{}",
            base_url.trim_end_matches('/'),
            reset.token
        );
        let message = Message {
            to: user.email.clone(),
            subject: "Password reset token".to_string(),
            body: format!(
                "You are receiving this email because you (or someone else) has requested the reset of a password. \
                 Please make a PUT request to: {url}"
            ),
        };

        if let Err(err) = self.mailer.send(&message).await {
            warn!(user_id = %user.id, error = %err, "reset email could not be sent");
            user.reset_password_token = None;
            user.reset_password_expire = None;
            self.persist(&user).await?;
            return Err(AuthError::DeliveryFailed(err.to_string()));
        }

        info!(user_id = %user.id, "password reset token issued");
        Ok(())
    }

    /// Redeem a reset token, set the new password and sign the account in.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Session> {
        validate_password(new_password)?;

        let document = self
            .store
            .find(USERS, Filter::eq("resetPasswordToken", reset::digest(token)))
            .first()
            .await?
            .ok_or(AuthError::InvalidResetToken)?;
        let mut user: User = from_document(document)?;

        let redeemed = reset::consume_at(
            token,
            user.reset_password_token.as_deref(),
            user.reset_password_expire,
            Utc::now(),
        );
        if !redeemed {
            warn!(user_id = %user.id, "rejected expired reset token");
            return Err(AuthError::InvalidResetToken);
        }

        user.set_password(new_password)?;
        user.reset_password_token = None;
        user.reset_password_expire = None;
        let user = self.persist(&user).await?;

        info!(user_id = %user.id, "password reset");
        self.session(user)
    }

    /// Apply an administrative update; `None` when the account does not exist.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.load_user(id).await? else {
            return Ok(None);
        };

        if let Some(name) = update.name.as_deref() {
            if name.trim().is_empty() {
                return Err(AuthError::Validation("Please add a name".to_string()));
            }
            user.name = name.trim().to_string();
        }
        if let Some(email) = update.email.as_deref() {
            validate_email(email.trim())?;
            user.email = email.trim().to_string();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(password) = update.password.as_deref() {
            user.set_password(password)?;
        }

        self.persist(&user).await.map(Some)
    }

    pub async fn delete_user(&self, id: &str) -> Result<Option<User>> {
        let removed = self.store.delete(USERS, id).await?;
        removed.map(from_document).transpose().map_err(AuthError::from)
    }

    /// Create the admin account unless one with `email` already exists.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<User> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }
        self.create_user("Admin", email, password, Role::Admin).await
    }

    pub async fn load_user(&self, id: &str) -> Result<Option<User>> {
        let document = self.store.find_by_id(USERS, id).await?;
        document.map(from_document).transpose().map_err(AuthError::from)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let document = self.store.find(USERS, Filter::eq("email", email)).first().await?;
        document.map(from_document).transpose().map_err(AuthError::from)
    }

    fn session(&self, user: User) -> Result<Session> {
        let token = self.tokens.issue(&user)?;
        Ok(Session { token, user })
    }

    /// Write the whole account back. Cleared reset fields are removed.
    async fn persist(&self, user: &User) -> Result<User> {
        let mut document = to_document(user)?;
        for key in ["resetPasswordToken", "resetPasswordExpire"] {
            document.entry(key).or_insert(Value::Null);
        }

        let stored = self
            .store
            .update(USERS, &user.id, document)
            .await
            .map_err(duplicate_email)?
            .ok_or(AuthError::UserNotFound)?;
        Ok(from_document(stored)?)
    }
}

fn duplicate_email(err: StorageError) -> AuthError {
    match err {
        StorageError::Duplicate { .. } => AuthError::DuplicateEmail,
        other => other.into(),
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation("Please add a valid email".to_string()))
    }
}
