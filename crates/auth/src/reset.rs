//! Time-boxed password reset tokens.
//!
//! The plaintext token is handed to the account holder once; only its SHA-256
//! digest and expiry are stored on the account.

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 20;

pub const DEFAULT_TTL_SECONDS: i64 = 600;

#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Hex plaintext; never stored.
    pub token: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn generate(ttl: Duration) -> Self {
        Self::generate_at(Utc::now(), ttl)
    }

    pub fn generate_at(now: DateTime<Utc>, ttl: Duration) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        Self {
            digest: digest(&token),
            token,
            expires_at: now + ttl,
        }
    }
}

/// Hex SHA-256 of a plaintext reset token.
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Whether `candidate` redeems the stored digest at `now`.
///
/// Redemption is single use only if the caller clears the stored fields in
/// the same write that changes the password.
pub fn consume_at(
    candidate: &str,
    stored_digest: Option<&str>,
    stored_expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (stored_digest, stored_expiry) {
        (Some(stored), Some(expiry)) => digest(candidate) == stored && now < expiry,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ttl() -> Duration {
        Duration::seconds(DEFAULT_TTL_SECONDS)
    }

    #[test]
    fn test_generated_token_shape() {
        let now = Utc::now();
        let reset = ResetToken::generate_at(now, ttl());

        assert_eq!(reset.token.len(), TOKEN_BYTES * 2);
        assert_eq!(reset.digest.len(), 64);
        assert_eq!(reset.digest, digest(&reset.token));
        assert_eq!(reset.expires_at, now + Duration::minutes(10));
        assert_ne!(reset.token, ResetToken::generate(ttl()).token);
    }

    #[test]
    fn test_consume_before_expiry() {
        let now = Utc::now();
        let reset = ResetToken::generate_at(now, ttl());

        assert!(consume_at(&reset.token, Some(&reset.digest), Some(reset.expires_at), now));
        assert!(!consume_at("deadbeef", Some(&reset.digest), Some(reset.expires_at), now));
    }

    #[test]
    fn test_consume_fails_at_and_after_expiry() {
        let now = Utc::now();
        let reset = ResetToken::generate_at(now, ttl());

        assert!(!consume_at(&reset.token, Some(&reset.digest), Some(reset.expires_at), reset.expires_at));
        assert!(!consume_at(
            &reset.token,
            Some(&reset.digest),
            Some(reset.expires_at),
            reset.expires_at + Duration::seconds(1)
        ));
    }

    #[test]
    fn test_cleared_fields_reject_reuse() {
        let now = Utc::now();
        let reset = ResetToken::generate_at(now, ttl());

        assert!(consume_at(&reset.token, Some(&reset.digest), Some(reset.expires_at), now));
        assert!(!consume_at(&reset.token, None, None, now));
    }
}
