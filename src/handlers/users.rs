// handlers/users.rs - /api/users, admin only
//
// Reads go through the generic entity handlers. Create and delete also
// maintain the user's profile, and updates rehash passwords.

use axum::{routing::get, Router};
use serde_json::{json, Value};

use super::entity;
use crate::crud::CrudError;
use crate::database::DocumentId;
use crate::error::ApiError;
use crate::middleware::{bind, Body, IdBody, IdParams, Reply, RequestContext, RouteOptions};
use crate::models::{NewUser, User, UserPatch};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let admin = RouteOptions::admin();
    Router::new()
        .route(
            "/api/users",
            get(bind(admin, entity::list::<User>)).post(bind(admin.created(), create_user)),
        )
        .route(
            "/api/users/:id",
            get(bind(admin, entity::get_one::<User>))
                .put(bind(admin, update_user))
                .delete(bind(admin, delete_user)),
        )
}

/// POST /api/users - creates the account together with its blank profile
async fn create_user(ctx: RequestContext, Body(new): Body<NewUser>) -> Result<Reply<String>, ApiError> {
    let registration = ctx.state.profiles().register(new).await?;
    Ok(Reply::new("User created", registration.user_id.to_hex()))
}

/// PUT /api/users/:id - an email owned by another account is a conflict
async fn update_user(ctx: RequestContext, params: IdBody<UserPatch>) -> Result<Reply<Value>, ApiError> {
    let user_id = DocumentId::parse_hex(&params.id).map_err(CrudError::from)?;
    let outcome = ctx.state.profiles().update_user(user_id, params.body).await?;
    if outcome.matched == 0 {
        return Err(ApiError::not_found(format!("User {} not found", params.id)));
    }
    let message = if outcome.modified == 0 { "No changes applied" } else { "User updated" };
    Ok(Reply::new(message, json!({ "matched": outcome.matched, "modified": outcome.modified })))
}

/// DELETE /api/users/:id - removes the profile, then the account
async fn delete_user(ctx: RequestContext, params: IdParams) -> Result<Reply<()>, ApiError> {
    let user_id = DocumentId::parse_hex(&params.id).map_err(CrudError::from)?;
    if ctx.state.profiles().delete_user(user_id).await? == 0 {
        return Err(ApiError::not_found(format!("User {} not found", params.id)));
    }
    Ok(Reply::message("User deleted"))
}
