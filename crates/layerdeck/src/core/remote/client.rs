//! Commerce HTTP Client
//!
//! reqwest-backed implementation of the design store and the product catalog.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::core::{
    catalog::{parse_product_list, CatalogSource, Product},
    design::Design,
    settings::RemoteSettings,
    CoreError, CoreResult, ExternalId,
};

use super::{add_to_cart, cart_url, CartCheckout, DesignStore, SaveReceipt};

/// Path of the anonymous id endpoint
pub const GENERATE_UUID_PATH: &str = "/generate-uuid/";

/// Path of the design save endpoint
pub const SAVE_DESIGN_PATH: &str = "/save-design/";

/// Path of the product listing endpoint
pub const PRODUCT_LIST_PATH: &str = "/dash/product-basic-details/";

#[derive(Debug, Deserialize)]
struct UuidResponse {
    anonymous_uuid: String,
}

/// Body of a design save request
#[derive(Debug, Serialize)]
pub struct SaveDesignRequest<'a> {
    pub anonymous_uuid: Uuid,
    pub design_data: &'a Design,
}

#[derive(Debug, Deserialize)]
struct SaveDesignResponse {
    id: ExternalId,
}

/// Client for the commerce API and storefront
pub struct CommerceClient {
    api_base_url: String,
    storefront_url: String,
    client: reqwest::Client,
}

impl CommerceClient {
    /// Creates a client from remote settings
    pub fn new(settings: &RemoteSettings) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            storefront_url: settings.storefront_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Full URL of an API endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Storefront cart link for a saved design record
    pub fn cart_url(&self, record_id: &ExternalId) -> String {
        cart_url(&self.storefront_url, record_id)
    }

    /// Runs the full add-to-cart flow against this service
    pub async fn add_to_cart(&self, design: &Design) -> CoreResult<CartCheckout> {
        add_to_cart(self, &self.storefront_url, design).await
    }

    async fn read_json(&self, response: reqwest::Response, what: &str) -> CoreResult<Value> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CoreError::RemoteServiceFailed(format!("Failed to read {} response: {}", what, e))
        })?;

        if !status.is_success() {
            error!(%status, "{} request rejected", what);
            return Err(CoreError::RemoteServiceFailed(format!(
                "{} failed ({}): {}",
                what, status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            CoreError::RemoteServiceFailed(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl DesignStore for CommerceClient {
    #[instrument(skip(self))]
    async fn issue_anonymous_uuid(&self) -> CoreResult<Uuid> {
        let response = self
            .client
            .get(self.endpoint(GENERATE_UUID_PATH))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| CoreError::RemoteServiceFailed(format!("UUID request failed: {}", e)))?;

        let value = self.read_json(response, "UUID").await?;
        let parsed: UuidResponse = serde_json::from_value(value).map_err(|e| {
            CoreError::RemoteServiceFailed(format!("Unexpected UUID response: {}", e))
        })?;

        let uuid = Uuid::parse_str(parsed.anonymous_uuid.trim()).map_err(|e| {
            CoreError::RemoteServiceFailed(format!(
                "Server issued an invalid anonymous id {:?}: {}",
                parsed.anonymous_uuid, e
            ))
        })?;
        debug!(%uuid, "Issued anonymous id");
        Ok(uuid)
    }

    #[instrument(skip(self, design), fields(design_id = %design.id))]
    async fn save_design(&self, anonymous_uuid: Uuid, design: &Design) -> CoreResult<SaveReceipt> {
        let request = SaveDesignRequest {
            anonymous_uuid,
            design_data: design,
        };

        let response = self
            .client
            .post(self.endpoint(SAVE_DESIGN_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::RemoteServiceFailed(format!("Save request failed: {}", e)))?;

        let value = self.read_json(response, "Save design").await?;
        let saved: SaveDesignResponse = serde_json::from_value(value).map_err(|e| {
            CoreError::RemoteServiceFailed(format!("Unexpected save response: {}", e))
        })?;

        Ok(SaveReceipt {
            record_id: saved.id,
            saved_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CatalogSource for CommerceClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> CoreResult<Vec<Product>> {
        let response = self
            .client
            .get(self.endpoint(PRODUCT_LIST_PATH))
            .send()
            .await
            .map_err(|e| {
                CoreError::RemoteServiceFailed(format!("Product request failed: {}", e))
            })?;

        let value = self.read_json(response, "Product list").await?;
        let products = parse_product_list(value)?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }
}
