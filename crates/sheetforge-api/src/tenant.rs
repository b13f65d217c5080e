//! Tenant extraction.
//!
//! Every gangsheet route is tenant-scoped. The tenant id arrives in the
//! `X-Tenant-Id` header, placed there by the authenticating gateway in front
//! of this service.

use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use uuid::Uuid;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant context extracted from request headers.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: Uuid,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        "Missing tenant header",
                        "MISSING_TENANT",
                    )),
                )
            })?;

        let tenant_id = header.parse::<Uuid>().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Invalid tenant header, expected a UUID",
                    "INVALID_TENANT",
                )),
            )
        })?;

        Ok(TenantContext { tenant_id })
    }
}
