use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Password verification failed")]
    VerificationError,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token generation failed: {0}")]
    TokenGenerationError(String),

    /// Malformed, forged, expired or orphaned session token.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid reset token")]
    InvalidResetToken,

    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("There is no user with that email")]
    UnknownEmail,

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("Email could not be sent: {0}")]
    DeliveryFailed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
