//! Configuration module
//!
//! Environment-driven configuration for the API binary and the engine.
//! Every knob has a default so a local run only needs `DATABASE_URL`.

use std::env;
use std::str::FromStr;

use crate::models::SheetSettings;
use crate::storage_types::StorageBackend;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_FETCH_CONCURRENCY: usize = 4;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    pub database_url: String,
    pub db_max_connections: u32,

    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,

    /// Base URL of the order/design service that resolves design items.
    pub design_source_base_url: Option<String>,

    // Engine tuning
    /// Bounded concurrency for source image fetches within one job.
    pub fetch_concurrency: usize,

    // Tenant default sheet settings (overridable per job)
    pub default_roll_width_in: f64,
    pub default_roll_height_in: f64,
    pub default_dpi: u32,
    pub default_gap_in: f64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let defaults = SheetSettings::default();

        Ok(Self {
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            storage_backend: env_parse_opt("STORAGE_BACKEND"),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            design_source_base_url: env::var("DESIGN_SOURCE_BASE_URL").ok(),
            fetch_concurrency: env_or("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY),
            default_roll_width_in: env_or("DEFAULT_ROLL_WIDTH_IN", defaults.roll_width_in),
            default_roll_height_in: env_or("DEFAULT_ROLL_HEIGHT_IN", defaults.roll_height_in),
            default_dpi: env_or("DEFAULT_DPI", defaults.dpi),
            default_gap_in: env_or("DEFAULT_GAP_IN", defaults.gap_in),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Tenant default layout settings built from the configured defaults.
    pub fn default_sheet_settings(&self) -> SheetSettings {
        SheetSettings {
            roll_width_in: self.default_roll_width_in,
            roll_height_in: self.default_roll_height_in,
            dpi: self.default_dpi,
            gap_in: self.default_gap_in,
            ..SheetSettings::default()
        }
    }
}

/// Read an env var and parse it, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parse_opt<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
