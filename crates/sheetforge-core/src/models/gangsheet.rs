use crate::models::SheetSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GangsheetStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl GangsheetStatus {
    /// Terminal states are immutable except for deletion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GangsheetStatus::Completed | GangsheetStatus::Failed)
    }
}

impl Display for GangsheetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            GangsheetStatus::Pending => write!(f, "pending"),
            GangsheetStatus::Processing => write!(f, "processing"),
            GangsheetStatus::Completed => write!(f, "completed"),
            GangsheetStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for GangsheetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GangsheetStatus::Pending),
            "processing" => Ok(GangsheetStatus::Processing),
            "completed" => Ok(GangsheetStatus::Completed),
            "failed" => Ok(GangsheetStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid gangsheet status: {}", s)),
        }
    }
}

/// The gangsheet job/request aggregate, tenant-scoped.
///
/// Created in `Pending` on submission, claimed into `Processing` by the
/// orchestrator, terminal in `Completed` (with `download_url` and
/// `sheet_count`) or `Failed` (with `error_message`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gangsheet {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub status: GangsheetStatus,
    /// Orders included in the request, in submission order.
    pub order_ids: Vec<Uuid>,
    /// Settings snapshot frozen at submission time.
    pub settings: SheetSettings,
    pub sheet_count: Option<i32>,
    pub download_url: Option<String>,
    pub error_message: Option<String>,
    /// Set when a delete arrives while the job is processing; the running
    /// pipeline observes it between stages and discards its output.
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Gangsheet {
    pub fn new(tenant_id: Uuid, name: String, order_ids: Vec<Uuid>, settings: SheetSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            status: GangsheetStatus::Pending,
            order_ids,
            settings,
            sheet_count: None,
            download_url: None,
            error_message: None,
            cancel_requested: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(feature = "sqlx")]
impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for Gangsheet {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Gangsheet {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            name: row.get("name"),
            status: row.get::<String, _>("status").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse gangsheet status: {}", e).into())
            })?,
            order_ids: row.get("order_ids"),
            settings: serde_json::from_value(row.get::<serde_json::Value, _>("settings")).map_err(
                |e| sqlx::Error::Decode(format!("Failed to parse gangsheet settings: {}", e).into()),
            )?,
            sheet_count: row.get("sheet_count"),
            download_url: row.get("download_url"),
            error_message: row.get("error_message"),
            cancel_requested: row.get("cancel_requested"),
            created_at: row.get("created_at"),
            completed_at: row.get("completed_at"),
        })
    }
}

/// Submission request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGangsheetRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, message = "order_ids must not be empty"))]
    pub order_ids: Vec<Uuid>,
    /// Optional per-job override; tenant defaults apply when absent.
    pub settings_override: Option<SheetSettings>,
}

/// Wire representation of a gangsheet record.
///
/// `download_url` and `error_message` are mutually exclusive and only present
/// in terminal states.
#[derive(Debug, Serialize, ToSchema)]
pub struct GangsheetResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub status: GangsheetStatus,
    pub order_ids: Vec<Uuid>,
    pub settings: SheetSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Gangsheet> for GangsheetResponse {
    fn from(g: Gangsheet) -> Self {
        Self {
            id: g.id,
            tenant_id: g.tenant_id,
            name: g.name,
            status: g.status,
            order_ids: g.order_ids,
            settings: g.settings,
            sheet_count: g.sheet_count,
            download_url: g.download_url,
            error_message: g.error_message,
            created_at: g.created_at,
            completed_at: g.completed_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListGangsheetsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Default for ListGangsheetsQuery {
    fn default() -> Self {
        Self {
            limit: Some(50),
            offset: Some(0),
        }
    }
}
