pub mod auth;
pub mod cli;
pub mod config;
pub mod crud;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod profile;
pub mod schema;
pub mod state;

pub use error::ApiError;
pub use state::AppState;
