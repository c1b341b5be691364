// handlers/auth.rs - POST /api/auth/register and POST /api/auth/login
//
// Both are public and hand back a bearer token signed with the configured
// secret.

use axum::{routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::issue_token;
use crate::error::ApiError;
use crate::middleware::{bind, Body, Reply, RequestContext, RouteOptions};
use crate::models::{NewUser, Role};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(bind(RouteOptions::public().created(), register)))
        .route("/api/auth/login", post(bind(RouteOptions::public(), login)))
}

/// Self-service sign-up. Admin accounts are only created by admins.
async fn register(ctx: RequestContext, Body(new): Body<NewUser>) -> Result<Reply<Value>, ApiError> {
    if new.role.is_admin() {
        return Err(ApiError::forbidden("Admin accounts cannot be self-registered"));
    }
    let security = &ctx.state.config.security;
    if security.jwt_secret.is_empty() {
        return Err(ApiError::ServiceUnavailable("Authentication is not configured".into()));
    }

    let profiles = ctx.state.profiles();
    let registration = profiles.register(new).await?;
    let token = match issue_token(security, registration.user_id, Role::User) {
        Ok(token) => token,
        Err(e) => {
            if let Err(cleanup) = profiles.delete_user(registration.user_id).await {
                tracing::error!("Failed to remove user {} after token error: {}", registration.user_id, cleanup);
            }
            return Err(e.into());
        }
    };

    Ok(Reply::new(
        "User registered",
        json!({
            "id": registration.user_id.to_hex(),
            "publicId": registration.public_id,
            "token": token,
        }),
    ))
}

async fn login(ctx: RequestContext, Body(request): Body<LoginRequest>) -> Result<Reply<Value>, ApiError> {
    let (user_id, user) = ctx.state.profiles().authenticate(&request.email, &request.password).await?;
    let security = &ctx.state.config.security;
    let token = issue_token(security, user_id, user.role)?;

    Ok(Reply::new(
        "Login successful",
        json!({
            "id": user_id.to_hex(),
            "role": user.role,
            "token": token,
            "expiresInHours": security.jwt_expiry_hours,
        }),
    ))
}
