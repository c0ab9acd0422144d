use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::password::PasswordDigest;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Account roles. Only `User` and `Publisher` can be self-assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Publisher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "publisher" => Ok(Role::Publisher),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// An account as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Empty until the record has been stored.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    password_hash: PasswordDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "storage::timestamp::option")]
    pub reset_password_expire: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "storage::timestamp::option")]
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(with = "storage::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create an unsaved account, hashing `password`.
    pub fn new(name: &str, email: &str, role: Role, password: &str) -> Result<Self> {
        validate_password(password)?;

        Ok(Self {
            id: String::new(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            role,
            password_hash: PasswordDigest::hash(password)?,
            reset_password_token: None,
            reset_password_expire: None,
            password_changed_at: None,
            created_at: Utc::now(),
        })
    }

    /// Replace the password. This is the only way the stored hash changes.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        validate_password(password)?;
        self.password_hash = PasswordDigest::hash(password)?;
        self.password_changed_at = Some(Utc::now());
        Ok(())
    }

    pub fn check_password(&self, candidate: &str) -> Result<bool> {
        self.password_hash.verify(candidate)
    }

    /// Whether a session issued at `issued_at` (unix seconds) predates the
    /// last password change.
    pub fn is_session_stale(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| issued_at < changed.timestamp())
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "storage::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}
