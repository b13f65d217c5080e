//! Shared key generation for storage backends.
//!
//! Every artifact of a gangsheet job lives under
//! `gangsheets/{tenant_id}/{gangsheet_id}/` so the whole job can be removed
//! with one prefix delete.

use uuid::Uuid;

/// The key prefix holding every blob of one gangsheet job, with a trailing slash.
pub fn job_prefix(tenant_id: Uuid, gangsheet_id: Uuid) -> String {
    format!("gangsheets/{}/{}/", tenant_id, gangsheet_id)
}

/// Key for one rendered sheet PNG. Sheet numbering is 1-based in filenames.
pub fn sheet_key(tenant_id: Uuid, gangsheet_id: Uuid, sheet_index: usize) -> String {
    format!(
        "{}sheet_{}.png",
        job_prefix(tenant_id, gangsheet_id),
        sheet_index + 1
    )
}

/// Key for the job's downloadable zip archive.
pub fn archive_key(tenant_id: Uuid, gangsheet_id: Uuid) -> String {
    format!("{}gangsheet.zip", job_prefix(tenant_id, gangsheet_id))
}
