//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use sheetforge_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sheetforge API",
        version = "0.1.0",
        description = "Gangsheet generation API. Packs design images onto print sheets, renders them as PNG rasters, and delivers a zip archive with a placement manifest. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::gangsheets::create_gangsheet,
        handlers::gangsheets::get_gangsheet,
        handlers::gangsheets::list_gangsheets,
        handlers::gangsheets::delete_gangsheet,
        handlers::health::health,
    ),
    components(schemas(
        models::CreateGangsheetRequest,
        models::GangsheetResponse,
        models::GangsheetStatus,
        models::ListGangsheetsQuery,
        models::SheetSettings,
        models::DesignItem,
        error::ErrorResponse,
    )),
    tags(
        (name = "gangsheets", description = "Gangsheet job management"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
