use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Successful operation outcome before it is wrapped in the envelope.
#[derive(Debug)]
pub struct Reply<T: Serialize> {
    pub message: String,
    pub result: Option<T>,
}

impl<T: Serialize> Reply<T> {
    pub fn new(message: impl Into<String>, result: T) -> Self {
        Self {
            message: message.into(),
            result: Some(result),
        }
    }
}

impl Reply<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result: None,
        }
    }
}

/// Wrapper for API responses that automatically adds the success envelope
/// `{success: true, message, result?}`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub reply: Reply<T>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_status(reply: Reply<T>, status_code: StatusCode) -> Self {
        Self { reply, status_code }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = json!({
            "success": true,
            "message": self.reply.message,
        });

        if let Some(result) = &self.reply.result {
            // Convert data to JSON Value for consistent envelope format
            match serde_json::to_value(result) {
                Ok(value) => envelope["result"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return failure(StatusCode::INTERNAL_SERVER_ERROR, "Unknown error: failed to serialize response");
                }
            }
        }

        (self.status_code, Json(envelope)).into_response()
    }
}

/// Error envelope `{success: false, message}`.
pub fn failure(status: StatusCode, message: &str) -> Response {
    let body: Value = json!({
        "success": false,
        "message": message,
    });
    (status, Json(body)).into_response()
}
