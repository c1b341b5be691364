use clap::ValueEnum;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DocumentId;
use crate::models::Role;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    User,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::User => Role::User,
            RoleArg::Admin => Role::Admin,
        }
    }
}

pub fn handle(
    config: AppConfig,
    user_id: &str,
    role: RoleArg,
    hours: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if !config.is_development() {
        tracing::warn!("Minting a token outside development");
    }
    let user_id = DocumentId::parse_hex(user_id)?;
    let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(user_id, role.into(), hours);
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    output_success(
        &output_format,
        "Token issued",
        Some(json!({ "token": token, "userId": user_id.to_hex(), "expiresAt": claims.exp })),
    )
}
