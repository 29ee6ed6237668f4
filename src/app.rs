//! Service bootstrap: store, module lifecycle, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use bookshop_db::DocumentStore;
use bookshop_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, books::routes::SharedStore};

/// Open the configured book store.
pub async fn open_store(settings: &Settings) -> anyhow::Result<SharedStore> {
    let store = match &settings.database.path {
        Some(path) => DocumentStore::open(path)
            .await
            .with_context(|| format!("failed to open book store at {}", path.display()))?,
        None => {
            tracing::warn!("no database path configured; books are kept in memory only");
            DocumentStore::in_memory()
        }
    };
    Ok(Arc::new(store))
}

/// Registry holding every service module, bound to `store`.
pub fn build_registry(store: SharedStore) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);
    registry
}

/// Run the service until shutdown.
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        database = ?settings.database.path,
        "bookshop bootstrap starting"
    );

    let store = open_store(settings).await?;
    let registry = build_registry(store);
    let ctx = InitCtx { settings };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    tracing::info!("bookshop bootstrap complete");

    let served = bookshop_http::start_server(&registry, settings).await;
    registry.stop_modules().await?;
    served
}
