// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::auth::JwtError;
use crate::crud::CrudError;
use crate::database::StoreError;
use crate::filter::FilterError;
use crate::middleware::auth::AuthError;
use crate::middleware::response::failure;
use crate::profile::ProfileError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{0}")]
    Validation(String),

    // 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 409 Conflict
    #[error("{0}")]
    Conflict(String),

    // 500, names the dangling reference
    #[error("Referential integrity error: {kind} {id} does not exist")]
    ReferentialIntegrity { kind: &'static str, id: String },

    // 503 Service Unavailable
    #[error("{0}")]
    ServiceUnavailable(String),

    // 500 Internal Server Error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ReferentialIntegrity { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ReferentialIntegrity { .. } => "REFERENTIAL_INTEGRITY_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Filter(e) => e.into(),
            StoreError::Closed => ApiError::unknown("store is shut down"),
            e @ StoreError::Duplicate { .. } => ApiError::Conflict(e.to_string()),
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::unknown("database error occurred")
            }
            other => {
                tracing::error!("Store error: {}", other);
                ApiError::unknown("storage error occurred")
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CrudError> for ApiError {
    fn from(err: CrudError) -> Self {
        match err {
            CrudError::InvalidId(e) => ApiError::Validation(e.to_string()),
            CrudError::Validation(msg) => ApiError::Validation(msg),
            e @ CrudError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            CrudError::Filter(e) => e.into(),
            CrudError::Store(e) => e.into(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            e @ (ProfileError::NotFound | ProfileError::NotAvailable) => ApiError::NotFound(e.to_string()),
            ProfileError::ReferentialIntegrity { kind, id } => {
                tracing::error!("Dangling {} reference {}", kind, id);
                ApiError::ReferentialIntegrity { kind, id: id.to_hex() }
            }
            ProfileError::Validation(msg) => ApiError::Validation(msg),
            ProfileError::Conflict(msg) => ApiError::Conflict(msg),
            e @ ProfileError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            e @ (ProfileError::Password(_) | ProfileError::Task(_)) => {
                tracing::error!("Account operation failed: {}", e);
                ApiError::unknown("account operation failed")
            }
            ProfileError::Crud(e) => e.into(),
            ProfileError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            e @ AuthError::Forbidden => ApiError::Forbidden(e.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        tracing::error!("Token issue failed: {}", err);
        ApiError::unknown("could not issue token")
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        failure(self.status_code(), &self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DocumentId, InvalidDocumentId};

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(AuthError::Forbidden).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(ProfileError::NotAvailable).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::unknown("boom").to_string(), "Unknown error: boom");
    }

    #[test]
    fn referential_integrity_names_the_id() {
        let id = DocumentId::generate();
        let err = ApiError::from(ProfileError::ReferentialIntegrity { kind: "Allergen", id });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains(&id.to_hex()));
    }

    #[test]
    fn invalid_ids_are_validation_errors() {
        let err = ApiError::from(CrudError::InvalidId(InvalidDocumentId("xyz".into())));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn store_internals_are_not_leaked() {
        let err = ApiError::from(StoreError::CorruptDocument { collection: "paps".into(), message: "secret detail".into() });
        assert!(!err.to_string().contains("secret detail"));
    }

    #[test]
    fn duplicate_values_are_conflicts() {
        let err = ApiError::from(StoreError::Duplicate { collection: "users".into(), constraint: "users_email_key".into() });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let err = ApiError::from(ProfileError::Task("panicked".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
