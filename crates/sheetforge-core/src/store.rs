//! Gangsheet store abstraction.
//!
//! The orchestrator only ever mutates gangsheet records through this trait;
//! the Postgres implementation lives in `sheetforge-db` and an in-memory
//! implementation for tests and local development lives in
//! `sheetforge-engine`. No other component writes `status`, `download_url`,
//! or `error_message`.

use crate::error::AppError;
use crate::models::Gangsheet;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait GangsheetStore: Send + Sync {
    /// Persist a freshly submitted gangsheet (status `Pending`).
    async fn create(&self, gangsheet: &Gangsheet) -> Result<(), AppError>;

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Gangsheet>, AppError>;

    /// Tenant-scoped listing, newest first.
    async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Gangsheet>, AppError>;

    /// Atomically transition `Pending -> Processing` and return the claimed
    /// record. Returns `None` when the record is missing or already claimed
    /// or terminal; losers of a concurrent claim race get `None` and must
    /// produce no side effects.
    async fn claim(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Gangsheet>, AppError>;

    /// Transition `Processing -> Completed`. Returns false when the job was
    /// cancelled in the meantime (the caller must then discard its output).
    async fn mark_completed(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        sheet_count: i32,
        download_url: &str,
    ) -> Result<bool, AppError>;

    /// Transition `Processing -> Failed` with a human-readable message.
    /// Returns false when the job was cancelled in the meantime.
    async fn mark_failed(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        error_message: &str,
    ) -> Result<bool, AppError>;

    /// Flag a `Processing` job for cancellation. Returns true if the flag was
    /// set (i.e. the job was still processing).
    async fn request_cancel(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Whether cancellation has been requested for the given job.
    async fn cancel_requested(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Remove the record. Returns true if a record was deleted.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}
