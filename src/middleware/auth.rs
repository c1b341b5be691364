use axum::http::HeaderMap;
use jsonwebtoken::{decode, DecodingKey, Validation};
use thiserror::Error;

use crate::auth::{Claims, Principal};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Admin privileges required")]
    Forbidden,
}

/// Resolves the caller behind a request. Token formats stay behind this seam.
pub trait AuthVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;
}

/// HS256 bearer token verification.
pub struct JwtVerifier {
    key: DecodingKey,
    configured: bool,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            configured: !secret.is_empty(),
        }
    }
}

impl AuthVerifier for JwtVerifier {
    fn verify(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = extract_jwt_from_headers(headers).map_err(AuthError::Unauthorized)?;
        let claims = self.validate_jwt(&token).map_err(AuthError::Unauthorized)?;
        Principal::try_from(claims).map_err(|e| AuthError::Unauthorized(format!("Invalid JWT subject: {}", e)))
    }
}

impl JwtVerifier {
    /// Validate JWT token and extract claims
    fn validate_jwt(&self, token: &str) -> Result<Claims, String> {
        if !self.configured {
            return Err("JWT secret not configured".to_string());
        }

        let token_data = decode::<Claims>(token, &self.key, &Validation::default())
            .map_err(|e| format!("Invalid JWT token: {}", e))?;

        Ok(token_data.claims)
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
