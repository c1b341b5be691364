// handlers/system.rs - GET / and GET /health

use axum::{routing::get, Router};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{bind, NoParams, Reply, RequestContext, RouteOptions};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(bind(RouteOptions::public(), root)))
        .route("/health", get(bind(RouteOptions::public(), health)))
}

async fn root(ctx: RequestContext, _: NoParams) -> Result<Reply<Value>, ApiError> {
    Ok(Reply::new(
        "Allergy Profile API",
        json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": ctx.state.config.environment,
            "endpoints": {
                "catalog": "/api/{allergens,symptoms,allergies,recommendations,action-plans}[/:id] (read public, write admin)",
                "users": "/api/users[/:id] (admin)",
                "profile": "/api/pap (auth), /api/pap/:userId (admin)",
                "public_profile": "/api/user-pap/public/:publicId (public)",
                "auth": "/api/auth/register, /api/auth/login (public)",
                "health": "/health (public)",
            }
        }),
    ))
}

async fn health(ctx: RequestContext, _: NoParams) -> Result<Reply<Value>, ApiError> {
    let now = chrono::Utc::now();
    match ctx.state.store.ping().await {
        Ok(()) => Ok(Reply::new("ok", json!({ "status": "ok", "timestamp": now, "database": "ok" }))),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            Err(ApiError::ServiceUnavailable("database unavailable".to_string()))
        }
    }
}
