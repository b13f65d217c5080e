//! Resolution of order ids into design items.
//!
//! The engine does not own order data; an upstream order/design service is
//! queried per order at job start. The resolved items are frozen for the
//! lifetime of the job.

use async_trait::async_trait;
use serde::Deserialize;
use sheetforge_core::models::DesignItem;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DesignSourceError {
    #[error("order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("order {order_id} has no design items")]
    DesignMissing { order_id: Uuid },

    #[error("design source error: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait DesignSource: Send + Sync {
    /// Resolve the design items of one order, preserving the order's own
    /// item ordering.
    async fn design_items(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<DesignItem>, DesignSourceError>;
}

/// Item as returned by the upstream order service; `order_id` is implied by
/// the request path.
#[derive(Debug, Deserialize)]
struct WireDesignItem {
    source_image_ref: String,
    width_in: f64,
    height_in: f64,
    quantity: u32,
}

/// Design source backed by an HTTP order service.
#[derive(Clone)]
pub struct HttpDesignSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDesignSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn items_url(&self, tenant_id: Uuid, order_id: Uuid) -> String {
        format!(
            "{}/tenants/{}/orders/{}/design-items",
            self.base_url.trim_end_matches('/'),
            tenant_id,
            order_id
        )
    }
}

#[async_trait]
impl DesignSource for HttpDesignSource {
    async fn design_items(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<DesignItem>, DesignSourceError> {
        let url = self.items_url(tenant_id, order_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DesignSourceError::Upstream(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DesignSourceError::OrderNotFound(order_id));
        }

        let response = response
            .error_for_status()
            .map_err(|e| DesignSourceError::Upstream(e.to_string()))?;

        let items: Vec<WireDesignItem> = response
            .json()
            .await
            .map_err(|e| DesignSourceError::Upstream(e.to_string()))?;

        Ok(items
            .into_iter()
            .map(|w| DesignItem {
                source_image_ref: w.source_image_ref,
                width_in: w.width_in,
                height_in: w.height_in,
                quantity: w.quantity,
                order_id,
            })
            .collect())
    }
}
