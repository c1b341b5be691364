// handlers/entity.rs - generic /api/<entity> and /api/<entity>/:id handlers
//
// Any `Entity` gets list/get/create/update/delete through these. Reads use
// the caller-provided options (public for catalogs), writes always need admin.

use axum::{routing::get, Router};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{bind, Body, IdBody, IdParams, ListParams, Reply, RequestContext, RouteOptions};
use crate::schema::Entity;
use crate::state::AppState;

pub fn entity_routes<E: Entity>(path: &str, read: RouteOptions) -> Router<AppState> {
    let item = format!("{}/:id", path);
    Router::new()
        .route(
            path,
            get(bind(read, list::<E>)).post(bind(RouteOptions::admin().created(), create::<E>)),
        )
        .route(
            &item,
            get(bind(read, get_one::<E>))
                .put(bind(RouteOptions::admin(), update::<E>))
                .delete(bind(RouteOptions::admin(), remove::<E>)),
        )
}

/// GET /api/<entity>?id&limit&offset&lang&<field>=<value>
pub async fn list<E: Entity>(ctx: RequestContext, ListParams(query): ListParams) -> Result<Reply<Vec<Value>>, ApiError> {
    let documents = ctx.state.operations::<E>().get_many(query).await?;
    Ok(Reply::new(format!("Found {} {}", documents.len(), E::SCHEMA.collection), documents))
}

/// POST /api/<entity> - result is the new id
pub async fn create<E: Entity>(ctx: RequestContext, Body(new): Body<E::New>) -> Result<Reply<String>, ApiError> {
    let id = ctx.state.operations::<E>().add(new).await?;
    Ok(Reply::new(format!("{} created", E::SCHEMA.name), id))
}

/// GET /api/<entity>/:id?lang
pub async fn get_one<E: Entity>(ctx: RequestContext, params: IdParams) -> Result<Reply<Value>, ApiError> {
    let document = ctx.state.operations::<E>().get_one(&params.id, params.lang.as_deref()).await?;
    Ok(Reply::new(format!("{} found", E::SCHEMA.name), document))
}

/// PUT /api/<entity>/:id
///
/// Only an id that matches nothing is a 404; a patch that matches but changes
/// nothing is reported as a successful no-op.
pub async fn update<E: Entity>(ctx: RequestContext, params: IdBody<E::Patch>) -> Result<Reply<Value>, ApiError> {
    let outcome = ctx.state.operations::<E>().update(&params.id, params.body).await?;
    if outcome.matched == 0 {
        return Err(ApiError::not_found(format!("{} {} not found", E::SCHEMA.name, params.id)));
    }
    let message = if outcome.modified == 0 {
        "No changes applied".to_string()
    } else {
        format!("{} updated", E::SCHEMA.name)
    };
    Ok(Reply::new(message, json!({ "matched": outcome.matched, "modified": outcome.modified })))
}

/// DELETE /api/<entity>/:id
pub async fn remove<E: Entity>(ctx: RequestContext, params: IdParams) -> Result<Reply<()>, ApiError> {
    let deleted = ctx.state.operations::<E>().delete(&params.id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found(format!("{} {} not found", E::SCHEMA.name, params.id)));
    }
    Ok(Reply::message(format!("{} deleted", E::SCHEMA.name)))
}
