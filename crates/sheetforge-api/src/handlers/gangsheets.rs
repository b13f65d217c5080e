use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use sheetforge_core::models::{CreateGangsheetRequest, GangsheetResponse, ListGangsheetsQuery};
use std::sync::Arc;
use uuid::Uuid;

/// Submit a gangsheet job
///
/// The job is persisted as `pending` and processed asynchronously; poll the
/// returned id until it reaches `completed` or `failed`.
#[utoipa::path(
    post,
    path = "/api/v0/gangsheets",
    request_body = CreateGangsheetRequest,
    responses(
        (status = 202, description = "Job accepted", body = GangsheetResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid tenant", body = ErrorResponse)
    ),
    tag = "gangsheets"
)]
#[tracing::instrument(skip(state, request))]
pub async fn create_gangsheet(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateGangsheetRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let gangsheet = state.service.submit(tenant_ctx.tenant_id, request).await?;

    // Process in the background; the record carries the outcome.
    let service = Arc::clone(&state.service);
    let (tenant_id, id) = (gangsheet.tenant_id, gangsheet.id);
    tokio::spawn(async move {
        if let Err(e) = service.run(tenant_id, id).await {
            tracing::error!(gangsheet_id = %id, tenant_id = %tenant_id, error = %e, "Gangsheet run failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GangsheetResponse::from(gangsheet)),
    ))
}

/// Get a gangsheet by id
#[utoipa::path(
    get,
    path = "/api/v0/gangsheets/{id}",
    params(("id" = Uuid, Path, description = "Gangsheet id")),
    responses(
        (status = 200, description = "Gangsheet record", body = GangsheetResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "gangsheets"
)]
#[tracing::instrument(skip(state))]
pub async fn get_gangsheet(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GangsheetResponse>, HttpAppError> {
    let gangsheet = state.service.get(tenant_ctx.tenant_id, id).await?;
    Ok(Json(GangsheetResponse::from(gangsheet)))
}

/// List gangsheets for the tenant, newest first
#[utoipa::path(
    get,
    path = "/api/v0/gangsheets",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, default 50, max 200"),
        ("offset" = Option<i64>, Query, description = "Page offset, default 0")
    ),
    responses((status = 200, description = "Gangsheet records")),
    tag = "gangsheets"
)]
#[tracing::instrument(skip(state))]
pub async fn list_gangsheets(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListGangsheetsQuery>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    let gangsheets = state
        .service
        .list(tenant_ctx.tenant_id, query.limit, query.offset)
        .await?;

    let responses: Vec<GangsheetResponse> =
        gangsheets.into_iter().map(GangsheetResponse::from).collect();

    Ok(Json(serde_json::json!({
        "gangsheets": responses,
        "count": responses.len()
    })))
}

/// Delete a gangsheet
///
/// Terminal and pending jobs are removed together with their stored sheets;
/// a processing job is cancelled and cleaned up by its own pipeline.
#[utoipa::path(
    delete,
    path = "/api/v0/gangsheets/{id}",
    params(("id" = Uuid, Path, description = "Gangsheet id")),
    responses(
        (status = 204, description = "Deleted or cancellation requested"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "gangsheets"
)]
#[tracing::instrument(skip(state))]
pub async fn delete_gangsheet(
    tenant_ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.service.delete(tenant_ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
