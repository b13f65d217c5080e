//! Application setup and initialization
//!
//! Wiring between configuration, the database, storage, the engine, and the
//! HTTP router, kept out of main.rs.

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use sheetforge_core::Config;
use sheetforge_db::PgGangsheetStore;
use sheetforge_engine::{
    GangsheetService, HttpDesignSource, HttpImageFetcher, StaticSettingsResolver,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with env-driven filtering. Defaults to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let pool = database::setup_database(&config).await?;

    let storage = sheetforge_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = ?storage.backend_type(), "Storage initialized");

    let store = Arc::new(PgGangsheetStore::new(pool));

    // One HTTP client shared by the design resolver and the image fetcher.
    let client = reqwest::Client::new();

    let design_source_base_url = config
        .design_source_base_url
        .clone()
        .context("DESIGN_SOURCE_BASE_URL must be set")?;
    let design_source = Arc::new(HttpDesignSource::new(
        client.clone(),
        design_source_base_url.clone(),
    ));
    let fetcher = Arc::new(HttpImageFetcher::new(
        client,
        Some(design_source_base_url),
    ));

    let settings_resolver = Arc::new(StaticSettingsResolver::new(config.default_sheet_settings()));

    let service = Arc::new(GangsheetService::new(
        store,
        storage,
        design_source,
        settings_resolver,
        fetcher,
        config.fetch_concurrency,
    ));

    let state = Arc::new(AppState::new(service));
    let router = routes::build_router(&config, state.clone());

    Ok((state, router))
}
