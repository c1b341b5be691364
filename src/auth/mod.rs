use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::DocumentId;
use crate::models::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Hex user id.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: DocumentId, role: Role, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id.to_hex(),
            role,
            iat: now.timestamp(),
            exp,
        }
    }
}

/// Identity resolved from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: DocumentId,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<Claims> for Principal {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = DocumentId::parse_hex(&claims.sub).map_err(|e| e.to_string())?;
        Ok(Self { user_id, role: claims.role })
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Mints a token for `user_id` with the configured secret and lifetime.
pub fn issue_token(security: &SecurityConfig, user_id: DocumentId, role: Role) -> Result<String, JwtError> {
    generate_jwt(&Claims::new(user_id, role, security.jwt_expiry_hours), &security.jwt_secret)
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash password for storage with bcrypt at the given work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Verify password against a stored bcrypt hash. A hash that cannot be parsed
/// is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    Ok(bcrypt::verify(password, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let stored = hash_password("peanut butter", 4).unwrap();
        assert!(stored.starts_with("$2"));
        assert!(!stored.contains("peanut"));
        assert!(verify_password("peanut butter", &stored).unwrap());
        assert!(!verify_password("peanut", &stored).unwrap());
        assert!(verify_password("peanut butter", "not-a-hash").is_err());
    }

    #[test]
    fn hash_carries_its_work_factor() {
        let stored = hash_password("same secret", 5).unwrap();
        assert!(stored.starts_with("$2b$05$"));
        assert_ne!(stored, hash_password("same secret", 5).unwrap());
    }

    #[test]
    fn out_of_range_cost_is_an_error() {
        assert!(hash_password("whatever", 2).is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let claims = Claims::new(DocumentId::generate(), Role::User, 1);
        assert!(matches!(generate_jwt(&claims, ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn claims_convert_to_principal() {
        let id = DocumentId::generate();
        let principal = Principal::try_from(Claims::new(id, Role::Admin, 1)).unwrap();
        assert_eq!(principal.user_id, id);
        assert!(principal.is_admin());
    }
}
