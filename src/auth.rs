//! Admin authentication: password hashing and bearer tokens.
//!
//! Passwords are stored as bcrypt hashes. Tokens are HS256 JWTs carrying the
//! admin username.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// bcrypt work factor for stored admin passwords
pub const PASSWORD_COST: u32 = 10;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, PASSWORD_COST)
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// JWT claims for an admin session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin username
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct JwtConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtConfig {
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Validates signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip_and_salt() {
        let a = hash_password("admin123").unwrap();
        let b = hash_password("admin123").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$2b$10$"));
        assert!(verify_password("admin123", &a));
        assert!(verify_password("admin123", &b));
        assert!(!verify_password("admin124", &a));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        for stored in ["", "plain", "$2b$10$short", "sha256$50000$00$00", "$2b$xx$abcdefghijklmnopqrstuuvwxyzabcdefghijklmnopqrstuvwxyz01"] {
            assert!(!verify_password("anything", stored), "{stored}");
        }
    }

    #[test]
    fn tokens_verify_with_the_same_secret_only() {
        let config = JwtConfig::from_secret(b"secret-a", Duration::from_secs(3600));
        let token = config.issue("admin").unwrap();
        assert_eq!(config.verify(&token).unwrap().sub, "admin");

        let other = JwtConfig::from_secret(b"secret-b", Duration::from_secs(3600));
        assert!(other.verify(&token).is_err());
        assert!(config.verify("not.a.token").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = JwtConfig::from_secret(b"s", Duration::from_secs(0));
        let claims = Claims {
            sub: "admin".into(),
            iat: 1,
            exp: 2,
        };
        let token = encode(&Header::default(), &claims, &config.encoding).unwrap();
        assert!(config.verify(&token).is_err());
    }
}
