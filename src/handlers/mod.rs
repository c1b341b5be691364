// handlers/mod.rs - route table
//
// Access is declared per route through `RouteOptions`:
// public (no token) → authenticated (any valid JWT) → admin (JWT with role admin)

pub mod auth;
pub mod entity;
pub mod profile;
pub mod system;
pub mod users;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::SecurityConfig;
use crate::middleware::RouteOptions;
use crate::models::{ActionPlan, Allergen, Allergy, Recommendation, Symptom};
use crate::state::AppState;

/// Every route, without global middleware.
pub fn routes() -> Router<AppState> {
    let catalog = RouteOptions::public();
    Router::new()
        .merge(system::routes())
        .merge(auth::routes())
        .merge(entity::entity_routes::<Allergen>("/api/allergens", catalog))
        .merge(entity::entity_routes::<Symptom>("/api/symptoms", catalog))
        .merge(entity::entity_routes::<Allergy>("/api/allergies", catalog))
        .merge(entity::entity_routes::<Recommendation>("/api/recommendations", catalog))
        .merge(entity::entity_routes::<ActionPlan>("/api/action-plans", catalog))
        .merge(users::routes())
        .merge(profile::routes())
}

/// The full application: routes, state, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);
    let router = routes().with_state(state);
    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    Some(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
}
