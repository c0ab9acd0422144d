// Core modules
mod error;
mod jwt;
mod password;
pub mod reset;

// Store-backed modules
pub mod mailer;
pub mod model;
pub mod service;

// Re-export error types
pub use error::{AuthError, Result};

// Re-export crypto primitives
pub use jwt::{Claims, TokenService, generate_token, validate_token};
pub use password::{PasswordDigest, hash_password, verify_password};
pub use reset::ResetToken;

pub use mailer::{LogMailer, MailError, Mailer, Message};
pub use model::{Role, User, UserProfile};
pub use service::{AuthService, Registration, Session, USERS, UserUpdate};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_jwt_token() {
        let secret = "test_secret_key_for_jwt";
        let claims = Claims::new("user_123".to_string(), Utc::now(), 3600);

        let token = generate_token(&claims, secret).unwrap();
        let decoded = validate_token(&token, secret).unwrap();

        assert_eq!(decoded, claims);
    }
}
