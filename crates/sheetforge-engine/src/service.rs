//! Gangsheet job lifecycle orchestration.

use crate::archive::build_archive;
use crate::design_source::{DesignSource, DesignSourceError};
use crate::fetch::{fetch_all, FetchError, SourceImageFetcher};
use crate::settings::SettingsResolver;
use sheetforge_compose::{render_sheet, RasterSheet, RenderError, SourceImages};
use sheetforge_core::models::{CreateGangsheetRequest, DesignItem, Gangsheet, Placement};
use sheetforge_core::{AppError, GangsheetStore};
use sheetforge_layout::{pack, PackingError};
use sheetforge_storage::{keys, Storage, StorageError};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Pipeline failure, prefixed with the stage that produced it. The stage name
/// ends up in the record's `error_message` so operators can tell a layout
/// overflow from a flaky upstream without reading logs.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("resolve: {0}")]
    Resolve(#[from] DesignSourceError),

    #[error("layout: {0}")]
    Layout(#[from] PackingError),

    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    #[error("render: {0}")]
    Render(#[from] RenderError),

    #[error("archive: {0}")]
    Archive(#[source] anyhow::Error),

    #[error("upload: {0}")]
    Upload(#[from] StorageError),

    #[error("store: {0}")]
    Store(#[from] AppError),

    #[error("internal: {0}")]
    Internal(String),
}

/// Everything the pipeline produced for a completed job.
struct PipelineOutput {
    sheet_count: i32,
    download_url: String,
}

pub struct GangsheetService {
    store: Arc<dyn GangsheetStore>,
    storage: Arc<dyn Storage>,
    design_source: Arc<dyn DesignSource>,
    settings_resolver: Arc<dyn SettingsResolver>,
    fetcher: Arc<dyn SourceImageFetcher>,
    fetch_concurrency: usize,
}

impl GangsheetService {
    pub fn new(
        store: Arc<dyn GangsheetStore>,
        storage: Arc<dyn Storage>,
        design_source: Arc<dyn DesignSource>,
        settings_resolver: Arc<dyn SettingsResolver>,
        fetcher: Arc<dyn SourceImageFetcher>,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            store,
            storage,
            design_source,
            settings_resolver,
            fetcher,
            fetch_concurrency,
        }
    }

    /// Validate and persist a new job in `Pending`. Processing is kicked off
    /// separately via [`GangsheetService::run`].
    pub async fn submit(
        &self,
        tenant_id: Uuid,
        request: CreateGangsheetRequest,
    ) -> Result<Gangsheet, AppError> {
        request.validate()?;

        let settings = match request.settings_override {
            Some(settings) => settings,
            None => self.settings_resolver.default_settings(tenant_id).await?,
        };
        settings.validate()?;

        let gangsheet = Gangsheet::new(tenant_id, request.name, request.order_ids, settings);
        self.store.create(&gangsheet).await?;

        tracing::info!(
            gangsheet_id = %gangsheet.id,
            tenant_id = %tenant_id,
            orders = gangsheet.order_ids.len(),
            "Gangsheet submitted"
        );

        Ok(gangsheet)
    }

    /// Claim a pending job and run it to a terminal state.
    ///
    /// Losing a claim race is not an error: the loser returns without side
    /// effects. Pipeline failures are recorded on the job, not returned; `Err`
    /// here means the store itself failed.
    pub async fn run(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let Some(gangsheet) = self.store.claim(tenant_id, id).await? else {
            tracing::debug!(gangsheet_id = %id, tenant_id = %tenant_id, "Claim lost or job not pending");
            return Ok(());
        };

        match self.execute(&gangsheet).await {
            Ok(Some(output)) => {
                let committed = self
                    .store
                    .mark_completed(tenant_id, id, output.sheet_count, &output.download_url)
                    .await?;
                if committed {
                    tracing::info!(
                        gangsheet_id = %id,
                        tenant_id = %tenant_id,
                        sheet_count = output.sheet_count,
                        "Gangsheet completed"
                    );
                } else {
                    // Cancelled while uploading; the output must not survive.
                    self.discard_cancelled(tenant_id, id).await;
                }
            }
            Ok(None) => {
                self.discard_cancelled(tenant_id, id).await;
            }
            Err(stage) => {
                tracing::error!(
                    gangsheet_id = %id,
                    tenant_id = %tenant_id,
                    error = %stage,
                    "Gangsheet pipeline failed"
                );
                // Roll back any blobs a partially completed upload left behind.
                self.cleanup_blobs(tenant_id, id).await;

                let recorded = self.store.mark_failed(tenant_id, id, &stage.to_string()).await?;
                if !recorded {
                    self.discard_cancelled(tenant_id, id).await;
                }
            }
        }

        Ok(())
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Gangsheet, AppError> {
        self.store
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Gangsheet {} not found", id)))
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Gangsheet>, AppError> {
        let limit = limit.unwrap_or(50).clamp(1, 200);
        let offset = offset.unwrap_or(0).max(0);
        self.store.list(tenant_id, limit, offset).await
    }

    /// Delete a job. Terminal and pending jobs are removed together with
    /// their blobs; a processing job is flagged for cancellation and the
    /// running pipeline removes everything when it observes the flag.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let gangsheet = self.get(tenant_id, id).await?;

        if gangsheet.status == sheetforge_core::models::GangsheetStatus::Processing {
            if self.store.request_cancel(tenant_id, id).await? {
                tracing::info!(gangsheet_id = %id, tenant_id = %tenant_id, "Cancellation requested");
                return Ok(());
            }
            // Fell out of Processing between the read and the flag; retry as
            // a plain delete below.
        }

        self.storage
            .delete_prefix(&keys::job_prefix(tenant_id, id))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        self.store.delete(tenant_id, id).await?;

        tracing::info!(gangsheet_id = %id, tenant_id = %tenant_id, "Gangsheet deleted");
        Ok(())
    }

    /// The pipeline proper. Returns `Ok(None)` when a cancellation flag was
    /// observed between stages.
    async fn execute(&self, gangsheet: &Gangsheet) -> Result<Option<PipelineOutput>, StageError> {
        let tenant_id = gangsheet.tenant_id;
        let id = gangsheet.id;
        let settings = &gangsheet.settings;

        // Resolve order ids into design items.
        let items = self.resolve_items(gangsheet).await?;
        if self.cancelled(tenant_id, id).await? {
            return Ok(None);
        }

        // Layout.
        let packing = pack(&items, settings)?;
        tracing::info!(
            gangsheet_id = %id,
            items = items.len(),
            units = packing.placements.len(),
            sheet_count = packing.sheet_count,
            "Layout computed"
        );
        if self.cancelled(tenant_id, id).await? {
            return Ok(None);
        }

        // Fetch source images.
        let references = items.iter().map(|i| i.source_image_ref.clone()).collect();
        let sources = fetch_all(
            Arc::clone(&self.fetcher),
            references,
            self.fetch_concurrency,
        )
        .await?;
        if self.cancelled(tenant_id, id).await? {
            return Ok(None);
        }

        // Render, one blocking task per sheet so the flag is observed
        // between sheets.
        let sheets = self
            .render_sheets(gangsheet, &packing.placements, &items, sources)
            .await?;
        let Some(sheets) = sheets else {
            return Ok(None);
        };

        // Archive.
        let archive =
            build_archive(gangsheet, &sheets, &packing.placements, &items).map_err(StageError::Archive)?;
        if self.cancelled(tenant_id, id).await? {
            return Ok(None);
        }

        // Upload sheets first, archive last; the archive URL is the download.
        for sheet in &sheets {
            let key = keys::sheet_key(tenant_id, id, sheet.sheet_index);
            self.storage
                .put(&key, sheet.png.clone(), "image/png")
                .await?;
        }
        let download_url = self
            .storage
            .put(
                &keys::archive_key(tenant_id, id),
                bytes::Bytes::from(archive),
                "application/zip",
            )
            .await?;

        Ok(Some(PipelineOutput {
            sheet_count: packing.sheet_count as i32,
            download_url,
        }))
    }

    async fn resolve_items(&self, gangsheet: &Gangsheet) -> Result<Vec<DesignItem>, StageError> {
        let mut items = Vec::new();
        for order_id in &gangsheet.order_ids {
            let order_items = self
                .design_source
                .design_items(gangsheet.tenant_id, *order_id)
                .await?;
            if order_items.is_empty() {
                return Err(DesignSourceError::DesignMissing {
                    order_id: *order_id,
                }
                .into());
            }
            for item in &order_items {
                item.validate()
                    .map_err(|e| DesignSourceError::Upstream(e.to_string()))?;
            }
            items.extend(order_items);
        }
        Ok(items)
    }

    async fn render_sheets(
        &self,
        gangsheet: &Gangsheet,
        placements: &[Placement],
        items: &[DesignItem],
        sources: SourceImages,
    ) -> Result<Option<Vec<RasterSheet>>, StageError> {
        let sheet_count = placements.iter().map(|p| p.sheet_index + 1).max().unwrap_or(0);

        let placements: Arc<[Placement]> = placements.to_vec().into();
        let items: Arc<[DesignItem]> = items.to_vec().into();
        let sources = Arc::new(sources);
        let settings = gangsheet.settings.clone();

        let mut sheets = Vec::with_capacity(sheet_count);
        for sheet_index in 0..sheet_count {
            if self.cancelled(gangsheet.tenant_id, gangsheet.id).await? {
                return Ok(None);
            }

            let placements = Arc::clone(&placements);
            let items = Arc::clone(&items);
            let sources = Arc::clone(&sources);
            let settings = settings.clone();

            let sheet: Result<RasterSheet, RenderError> = tokio::task::spawn_blocking(move || {
                render_sheet(sheet_index, &placements, &items, &sources, &settings)
            })
            .await
            .map_err(|e| StageError::Internal(format!("render task panicked: {}", e)))?;

            sheets.push(sheet?);
        }

        Ok(Some(sheets))
    }

    async fn cancelled(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, StageError> {
        Ok(self.store.cancel_requested(tenant_id, id).await?)
    }

    /// A cancelled job leaves nothing behind: blobs first, then the record.
    async fn discard_cancelled(&self, tenant_id: Uuid, id: Uuid) {
        tracing::info!(gangsheet_id = %id, tenant_id = %tenant_id, "Gangsheet cancelled, discarding output");
        self.cleanup_blobs(tenant_id, id).await;
        if let Err(e) = self.store.delete(tenant_id, id).await {
            tracing::error!(gangsheet_id = %id, error = %e, "Failed to delete cancelled gangsheet record");
        }
    }

    async fn cleanup_blobs(&self, tenant_id: Uuid, id: Uuid) {
        if let Err(e) = self
            .storage
            .delete_prefix(&keys::job_prefix(tenant_id, id))
            .await
        {
            tracing::error!(gangsheet_id = %id, error = %e, "Failed to clean up gangsheet blobs");
        }
    }
}
