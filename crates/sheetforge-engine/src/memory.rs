//! In-memory gangsheet store.
//!
//! Mirrors the compare-and-set semantics of the Postgres store so pipeline
//! tests exercise the same transition rules without a database.

use async_trait::async_trait;
use chrono::Utc;
use sheetforge_core::models::{Gangsheet, GangsheetStatus};
use sheetforge_core::{AppError, GangsheetStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryGangsheetStore {
    records: Arc<RwLock<HashMap<(Uuid, Uuid), Gangsheet>>>,
}

impl InMemoryGangsheetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GangsheetStore for InMemoryGangsheetStore {
    async fn create(&self, gangsheet: &Gangsheet) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let key = (gangsheet.tenant_id, gangsheet.id);
        if records.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "gangsheet {} already exists",
                gangsheet.id
            )));
        }
        records.insert(key, gangsheet.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Gangsheet>, AppError> {
        Ok(self.records.read().await.get(&(tenant_id, id)).cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Gangsheet>, AppError> {
        let records = self.records.read().await;
        let mut rows: Vec<Gangsheet> = records
            .values()
            .filter(|g| g.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn claim(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Gangsheet>, AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(tenant_id, id)) {
            Some(g) if g.status == GangsheetStatus::Pending => {
                g.status = GangsheetStatus::Processing;
                Ok(Some(g.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_completed(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        sheet_count: i32,
        download_url: &str,
    ) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(tenant_id, id)) {
            Some(g) if g.status == GangsheetStatus::Processing && !g.cancel_requested => {
                g.status = GangsheetStatus::Completed;
                g.sheet_count = Some(sheet_count);
                g.download_url = Some(download_url.to_string());
                g.completed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        error_message: &str,
    ) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(tenant_id, id)) {
            Some(g) if g.status == GangsheetStatus::Processing && !g.cancel_requested => {
                g.status = GangsheetStatus::Failed;
                g.error_message = Some(error_message.to_string());
                g.completed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn request_cancel(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(tenant_id, id)) {
            Some(g) if g.status == GangsheetStatus::Processing => {
                g.cancel_requested = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_requested(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        // A deleted record counts as cancelled so an in-flight pipeline stops.
        Ok(self
            .records
            .read()
            .await
            .get(&(tenant_id, id))
            .map(|g| g.cancel_requested)
            .unwrap_or(true))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .records
            .write()
            .await
            .remove(&(tenant_id, id))
            .is_some())
    }
}
