use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::handlers;
use crate::models;
use crate::state::AppState;

pub async fn handle(config: AppConfig, in_memory: bool) -> anyhow::Result<()> {
    info!("Starting Allergy Profile API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET is not set, refusing to serve without a signing secret");
    }

    let store: Arc<dyn DocumentStore> = if in_memory {
        warn!("Using the in-memory store, data is lost on exit");
        Arc::new(MemoryDocumentStore::new().with_unique_text_fields(models::UNIQUE_TEXT_FIELDS))
    } else {
        let store = PgDocumentStore::connect(&config.database)
            .await
            .context("could not connect to the database")?;
        store
            .migrate(models::collections(), models::UNIQUE_TEXT_FIELDS)
            .await.context("could not prepare collection tables")?;
        Arc::new(store)
    };

    let address = config.bind_address();
    let app = handlers::app(AppState::new(store.clone(), config));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Server running on http://{}", address);

    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;

    info!("Server stopped, closing store");
    store.shutdown().await;
    served.context("server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
