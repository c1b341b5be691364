use anyhow::Context;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DocumentStore, PgDocumentStore};
use crate::models;

pub async fn handle(config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = PgDocumentStore::connect(&config.database)
        .await
        .context("could not connect to the database")?;
    let outcome = store.migrate(models::collections(), models::UNIQUE_TEXT_FIELDS).await;
    store.shutdown().await;
    outcome.context("migration failed")?;

    let collections: Vec<&str> = models::collections().collect();
    output_success(
        &output_format,
        "Collections ready",
        Some(json!({ "collections": collections.join(", ") })),
    )
}
