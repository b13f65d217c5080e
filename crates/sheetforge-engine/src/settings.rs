//! Per-tenant layout defaults.
//!
//! Tenant settings live in an external service this engine does not own. The
//! resolver is read-only here; a job freezes whatever it returns (or the
//! per-job override) at submission time.

use async_trait::async_trait;
use sheetforge_core::models::SheetSettings;
use sheetforge_core::AppError;
use uuid::Uuid;

#[async_trait]
pub trait SettingsResolver: Send + Sync {
    /// Default sheet settings for one tenant.
    async fn default_settings(&self, tenant_id: Uuid) -> Result<SheetSettings, AppError>;
}

/// Resolver that hands every tenant the same configured defaults. Stands in
/// until tenants get their own settings records.
pub struct StaticSettingsResolver {
    defaults: SheetSettings,
}

impl StaticSettingsResolver {
    pub fn new(defaults: SheetSettings) -> Self {
        Self { defaults }
    }
}

#[async_trait]
impl SettingsResolver for StaticSettingsResolver {
    async fn default_settings(&self, _tenant_id: Uuid) -> Result<SheetSettings, AppError> {
        Ok(self.defaults.clone())
    }
}
