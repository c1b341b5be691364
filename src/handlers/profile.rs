// handlers/profile.rs - personal allergy profile endpoints
//
// GET/PUT /api/pap               caller's own profile
// GET/PUT /api/pap/:id           any user's profile (admin)
// GET /api/user-pap/public/:publicId   shared view, no auth

use axum::{routing::get, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::crud::CrudError;
use crate::database::DocumentId;
use crate::error::ApiError;
use crate::middleware::{bind, Body, IdBody, IdParams, LangParams, PublicIdParams, Reply, RequestContext, RouteOptions};
use crate::models::PapPatch;
use crate::profile::display::{DISPLAY_PAP_SCHEMA, PUBLIC_PAP_SCHEMA};
use crate::profile::ProfileError;
use crate::schema::{project, EntitySchema};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/pap",
            get(bind(RouteOptions::authenticated(), own_profile))
                .put(bind(RouteOptions::authenticated(), update_own_profile)),
        )
        .route(
            "/api/pap/:id",
            get(bind(RouteOptions::admin(), user_profile)).put(bind(RouteOptions::admin(), update_user_profile)),
        )
        .route("/api/user-pap/public/:publicId", get(bind(RouteOptions::public(), public_profile)))
}

async fn own_profile(ctx: RequestContext, params: LangParams) -> Result<Reply<Value>, ApiError> {
    let user_id = ctx.principal()?.user_id;
    display_profile(&ctx, user_id, params.lang.as_deref()).await
}

async fn update_own_profile(ctx: RequestContext, Body(patch): Body<PapPatch>) -> Result<Reply<Value>, ApiError> {
    let user_id = ctx.principal()?.user_id;
    apply_patch(&ctx, user_id, patch).await
}

async fn user_profile(ctx: RequestContext, params: IdParams) -> Result<Reply<Value>, ApiError> {
    let user_id = parse_user_id(&params.id)?;
    display_profile(&ctx, user_id, params.lang.as_deref()).await
}

async fn update_user_profile(ctx: RequestContext, params: IdBody<PapPatch>) -> Result<Reply<Value>, ApiError> {
    let user_id = parse_user_id(&params.id)?;
    apply_patch(&ctx, user_id, params.body).await
}

/// Unknown and private ids share one response.
async fn public_profile(ctx: RequestContext, params: PublicIdParams) -> Result<Reply<Value>, ApiError> {
    let public = ctx.state.profiles().get_public_profile(&params.public_id).await?;
    Ok(Reply::new("Profile found", localize(&public, &PUBLIC_PAP_SCHEMA, params.lang.as_deref())?))
}

async fn display_profile(ctx: &RequestContext, user_id: DocumentId, lang: Option<&str>) -> Result<Reply<Value>, ApiError> {
    let display = ctx
        .state
        .profiles()
        .get_display_profile(user_id)
        .await?
        .ok_or(ProfileError::NotFound)?;
    Ok(Reply::new("Profile found", localize(&display, &DISPLAY_PAP_SCHEMA, lang)?))
}

async fn apply_patch(ctx: &RequestContext, user_id: DocumentId, patch: PapPatch) -> Result<Reply<Value>, ApiError> {
    let revision = ctx.state.profiles().update_profile(user_id, patch).await?;
    Ok(Reply::new("Profile updated", json!({ "revision": revision })))
}

fn parse_user_id(raw: &str) -> Result<DocumentId, ApiError> {
    Ok(DocumentId::parse_hex(raw).map_err(CrudError::from)?)
}

fn localize<T: Serialize>(value: &T, schema: &EntitySchema, lang: Option<&str>) -> Result<Value, ApiError> {
    let value = serde_json::to_value(value).map_err(|e| ApiError::unknown(e.to_string()))?;
    Ok(match lang {
        Some(lang) => project(value, schema, lang),
        None => value,
    })
}
