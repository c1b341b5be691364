//! Binds an operation to an HTTP route.
//!
//! Order per request: authenticate and authorize, parse parameters, run the
//! operation under the request timeout, wrap the outcome in the envelope.
//! Nothing is retried.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::auth::AuthError;
use super::params::{OperationParams, RawRequest};
use super::response::{ApiResponse, Reply};
use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    pub need_auth: bool,
    pub need_admin: bool,
    pub success: StatusCode,
}

impl RouteOptions {
    pub const fn public() -> Self {
        Self {
            need_auth: false,
            need_admin: false,
            success: StatusCode::OK,
        }
    }

    pub const fn authenticated() -> Self {
        Self {
            need_auth: true,
            need_admin: false,
            success: StatusCode::OK,
        }
    }

    pub const fn admin() -> Self {
        Self {
            need_auth: true,
            need_admin: true,
            success: StatusCode::OK,
        }
    }

    pub const fn created(mut self) -> Self {
        self.success = StatusCode::CREATED;
        self
    }
}

/// Per-request context passed to every bound operation.
#[derive(Clone)]
pub struct RequestContext {
    pub state: AppState,
    pub principal: Option<Principal>,
}

impl RequestContext {
    /// The authenticated caller. Only bound operations with `need_auth` may rely on it.
    pub fn principal(&self) -> Result<Principal, ApiError> {
        self.principal
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Wraps `op` into an axum handler honoring `options`.
pub fn bind<P, T, F, Fut>(
    options: RouteOptions,
    op: F,
) -> impl Fn(State<AppState>, Option<Path<HashMap<String, String>>>, Uri, HeaderMap, Bytes) -> BoxFuture<'static, Response>
       + Clone
       + Send
       + Sync
       + 'static
where
    P: OperationParams,
    T: Serialize + Send + 'static,
    F: Fn(RequestContext, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply<T>, ApiError>> + Send + 'static,
{
    move |State(state): State<AppState>, path: Option<Path<HashMap<String, String>>>, uri: Uri, headers: HeaderMap, body: Bytes| {
        let op = op.clone();
        Box::pin(async move {
            if state.config.api.enable_request_logging {
                info!("Handling {}", uri.path());
            }
            match run(options, op, state, path, uri, headers, body).await {
                Ok(reply) => ApiResponse::with_status(reply, options.success).into_response(),
                Err(err) => {
                    debug!("Request failed with {}: {}", err.error_code(), err);
                    err.into_response()
                }
            }
        })
    }
}

async fn run<P, T, F, Fut>(
    options: RouteOptions,
    op: F,
    state: AppState,
    path: Option<Path<HashMap<String, String>>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Reply<T>, ApiError>
where
    P: OperationParams,
    T: Serialize + Send + 'static,
    F: Fn(RequestContext, P) -> Fut,
    Fut: Future<Output = Result<Reply<T>, ApiError>>,
{
    let principal = authorize(options, &state, &headers)?;
    let params = P::parse(raw_request(path, &uri, &body)?).map_err(ApiError::Validation)?;

    let timeout = Duration::from_secs(state.config.api.request_timeout_secs);
    let context = RequestContext { state, principal };
    match tokio::time::timeout(timeout, op(context, params)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ApiError::unknown(format!("request timed out after {}s", timeout.as_secs()))),
    }
}

fn authorize(options: RouteOptions, state: &AppState, headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    if !options.need_auth {
        return Ok(None);
    }
    let principal = state.verifier.verify(headers)?;
    if options.need_admin && !principal.is_admin() {
        return Err(AuthError::Forbidden.into());
    }
    Ok(Some(principal))
}

fn raw_request(path: Option<Path<HashMap<String, String>>>, uri: &Uri, body: &Bytes) -> Result<RawRequest, ApiError> {
    let query = uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice::<Value>(body).map_err(|e| ApiError::validation(format!("Invalid JSON body: {}", e)))?)
    };

    Ok(RawRequest {
        path: path.map(|Path(p)| p).unwrap_or_default(),
        query,
        body,
    })
}
