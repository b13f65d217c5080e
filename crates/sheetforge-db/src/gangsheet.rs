//! Gangsheet repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use sheetforge_core::models::{Gangsheet, GangsheetStatus};
use sheetforge_core::{AppError, GangsheetStore};

const COLUMNS: &str = "id, tenant_id, name, status, order_ids, settings, \
     sheet_count, download_url, error_message, cancel_requested, created_at, completed_at";

#[derive(Clone)]
pub struct PgGangsheetStore {
    pool: PgPool,
}

impl PgGangsheetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GangsheetStore for PgGangsheetStore {
    async fn create(&self, gangsheet: &Gangsheet) -> Result<(), AppError> {
        let settings = serde_json::to_value(&gangsheet.settings)?;

        sqlx::query(
            r#"
            INSERT INTO gangsheets (
                id, tenant_id, name, status, order_ids, settings,
                sheet_count, download_url, error_message, cancel_requested,
                created_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(gangsheet.id)
        .bind(gangsheet.tenant_id)
        .bind(&gangsheet.name)
        .bind(gangsheet.status.to_string())
        .bind(&gangsheet.order_ids)
        .bind(&settings)
        .bind(gangsheet.sheet_count)
        .bind(&gangsheet.download_url)
        .bind(&gangsheet.error_message)
        .bind(gangsheet.cancel_requested)
        .bind(gangsheet.created_at)
        .bind(gangsheet.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Gangsheet>, AppError> {
        let row = sqlx::query_as::<Postgres, Gangsheet>(&format!(
            "SELECT {COLUMNS} FROM gangsheets WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Gangsheet>, AppError> {
        let rows = sqlx::query_as::<Postgres, Gangsheet>(&format!(
            r#"
            SELECT {COLUMNS} FROM gangsheets
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn claim(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Gangsheet>, AppError> {
        // Compare-and-set claim: only one caller wins the pending record.
        let row = sqlx::query_as::<Postgres, Gangsheet>(&format!(
            r#"
            UPDATE gangsheets
            SET status = $3
            WHERE tenant_id = $1 AND id = $2 AND status = $4
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(GangsheetStatus::Processing.to_string())
        .bind(GangsheetStatus::Pending.to_string())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref g) = row {
            tracing::info!(gangsheet_id = %g.id, tenant_id = %tenant_id, "Gangsheet claimed for processing");
        }

        Ok(row)
    }

    async fn mark_completed(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        sheet_count: i32,
        download_url: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE gangsheets
            SET status = $3, sheet_count = $4, download_url = $5, completed_at = $6
            WHERE tenant_id = $1 AND id = $2
                AND status = $7 AND NOT cancel_requested
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(GangsheetStatus::Completed.to_string())
        .bind(sheet_count)
        .bind(download_url)
        .bind(Utc::now())
        .bind(GangsheetStatus::Processing.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        error_message: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE gangsheets
            SET status = $3, error_message = $4, completed_at = $5
            WHERE tenant_id = $1 AND id = $2
                AND status = $6 AND NOT cancel_requested
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(GangsheetStatus::Failed.to_string())
        .bind(error_message)
        .bind(Utc::now())
        .bind(GangsheetStatus::Processing.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn request_cancel(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE gangsheets
            SET cancel_requested = TRUE
            WHERE tenant_id = $1 AND id = $2 AND status = $3
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(GangsheetStatus::Processing.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel_requested(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let flag: Option<bool> = sqlx::query_scalar(
            "SELECT cancel_requested FROM gangsheets WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        // A deleted record counts as cancelled so an in-flight pipeline stops.
        Ok(flag.unwrap_or(true))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM gangsheets WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
