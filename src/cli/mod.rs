pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "allergy-api")]
#[command(about = "Allergy Profile API - catalogs and personal allergy profiles over HTTP")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Use a process-local store instead of PostgreSQL")]
        in_memory: bool,
    },

    #[command(about = "Create the collection tables in PostgreSQL")]
    Migrate,

    #[command(about = "Mint a bearer token with the configured secret (development)")]
    Token {
        #[arg(long, help = "24-character hex user id")]
        user_id: String,
        #[arg(long, value_enum, default_value = "user", help = "Role claim")]
        role: commands::token::RoleArg,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve { in_memory } => commands::serve::handle(config, in_memory).await,
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::Token { user_id, role, hours } => commands::token::handle(config, &user_id, role, hours, output_format),
    }
}
