//! HTTP surface tests over an in-memory engine.
//!
//! The router is exercised end to end with `tower::ServiceExt::oneshot`;
//! persistence and blob storage are in-memory doubles so no external
//! services are needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use sheetforge_api::state::AppState;
use sheetforge_api::tenant::TENANT_HEADER;
use sheetforge_core::models::{DesignItem, SheetSettings};
use sheetforge_core::{Config, StorageBackend};
use sheetforge_engine::{
    DesignSource, DesignSourceError, FetchError, GangsheetService, InMemoryGangsheetStore,
    SourceImageFetcher, StaticSettingsResolver,
};
use sheetforge_storage::MemoryStorage;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct StaticDesignSource {
    orders: HashMap<Uuid, Vec<DesignItem>>,
}

#[async_trait]
impl DesignSource for StaticDesignSource {
    async fn design_items(
        &self,
        _tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<DesignItem>, DesignSourceError> {
        self.orders
            .get(&order_id)
            .cloned()
            .ok_or(DesignSourceError::OrderNotFound(order_id))
    }
}

struct MapImageFetcher {
    images: HashMap<String, Bytes>,
}

#[async_trait]
impl SourceImageFetcher for MapImageFetcher {
    async fn fetch(&self, reference: &str) -> Result<Bytes, FetchError> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(reference.to_string()))
    }
}

fn red_png() -> Bytes {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    Bytes::from(buf.into_inner())
}

fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec![],
        environment: "test".to_string(),
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        storage_backend: Some(StorageBackend::Memory),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: None,
        local_storage_base_url: None,
        design_source_base_url: None,
        fetch_concurrency: 2,
        default_roll_width_in: 10.0,
        default_roll_height_in: 10.0,
        default_dpi: 10,
        default_gap_in: 0.25,
    }
}

struct Harness {
    app: Router,
    tenant_id: Uuid,
    order_id: Uuid,
}

fn harness() -> Harness {
    let tenant_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    let items = vec![DesignItem {
        source_image_ref: "designs/front.png".to_string(),
        width_in: 4.0,
        height_in: 4.0,
        quantity: 1,
        order_id,
    }];
    let mut images = HashMap::new();
    images.insert("designs/front.png".to_string(), red_png());

    let config = test_config();
    let service = Arc::new(GangsheetService::new(
        Arc::new(InMemoryGangsheetStore::new()),
        Arc::new(MemoryStorage::new("mem://blobs")),
        Arc::new(StaticDesignSource {
            orders: HashMap::from([(order_id, items)]),
        }),
        Arc::new(StaticSettingsResolver::new(config.default_sheet_settings())),
        Arc::new(MapImageFetcher { images }),
        config.fetch_concurrency,
    ));
    let state = Arc::new(AppState::new(service));
    let app = sheetforge_api::setup::routes::build_router(&config, state);

    Harness {
        app,
        tenant_id,
        order_id,
    }
}

fn create_body(order_id: Uuid) -> String {
    serde_json::json!({
        "name": "batch 42",
        "order_ids": [order_id]
    })
    .to_string()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_spec_served() {
    let h = harness();
    let response = h
        .app
        .oneshot(
            Request::get("/api/v0/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/api/v0/gangsheets"].is_object());
}

#[tokio::test]
async fn test_create_requires_tenant_header() {
    let h = harness();
    let response = h
        .app
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body(h.order_id)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], "MISSING_TENANT");
}

#[tokio::test]
async fn test_create_rejects_malformed_tenant_header() {
    let h = harness();
    let response = h
        .app
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, "not-a-uuid")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body(h.order_id)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INVALID_TENANT");
}

#[tokio::test]
async fn test_create_rejects_invalid_body() {
    let h = harness();
    let response = h
        .app
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name": "x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(body["code"].is_string());
}

#[tokio::test]
async fn test_create_rejects_empty_order_ids() {
    let h = harness();
    let body = serde_json::json!({ "name": "batch", "order_ids": [] }).to_string();
    let response = h
        .app
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_returns_accepted_pending() {
    let h = harness();
    let response = h
        .app
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body(h.order_id)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["name"], "batch 42");
    assert_eq!(body["tenant_id"], h.tenant_id.to_string());
    assert!(body["id"].as_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn test_job_reaches_completed_and_is_fetchable() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body(h.order_id)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // The pipeline runs on a background task; poll until terminal.
    let mut last = serde_json::Value::Null;
    for _ in 0..100 {
        let response = h
            .app
            .clone()
            .oneshot(
                Request::get(format!("/api/v0/gangsheets/{}", id))
                    .header(TENANT_HEADER, h.tenant_id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = json_body(response).await;
        if last["status"] == "completed" || last["status"] == "failed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert_eq!(last["status"], "completed", "job did not complete: {last}");
    assert_eq!(last["sheet_count"], 1);
    assert!(last["download_url"]
        .as_str()
        .unwrap()
        .ends_with("gangsheet.zip"));
}

#[tokio::test]
async fn test_get_is_tenant_scoped() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body(h.order_id)))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap();

    let other_tenant = Uuid::new_v4();
    let response = h
        .app
        .oneshot(
            Request::get(format!("/api/v0/gangsheets/{}", id))
                .header(TENANT_HEADER, other_tenant.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_returns_tenant_jobs() {
    let h = harness();
    for _ in 0..2 {
        let response = h
            .app
            .clone()
            .oneshot(
                Request::post("/api/v0/gangsheets")
                    .header(TENANT_HEADER, h.tenant_id.to_string())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(create_body(h.order_id)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = h
        .app
        .oneshot(
            Request::get("/api/v0/gangsheets?limit=10")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["gangsheets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_then_get_returns_not_found() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/v0/gangsheets")
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(create_body(h.order_id)))
                .unwrap(),
        )
        .await
        .unwrap();
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Let the background run reach a terminal state before deleting.
    for _ in 0..100 {
        let response = h
            .app
            .clone()
            .oneshot(
                Request::get(format!("/api/v0/gangsheets/{}", id))
                    .header(TENANT_HEADER, h.tenant_id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        if body["status"] == "completed" || body["status"] == "failed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let response = h
        .app
        .clone()
        .oneshot(
            Request::delete(format!("/api/v0/gangsheets/{}", id))
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = h
        .app
        .oneshot(
            Request::get(format!("/api/v0/gangsheets/{}", id))
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_returns_not_found() {
    let h = harness();
    let response = h
        .app
        .oneshot(
            Request::delete(format!("/api/v0/gangsheets/{}", Uuid::new_v4()))
                .header(TENANT_HEADER, h.tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
