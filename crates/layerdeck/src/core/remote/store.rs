//! Design Store Seam
//!
//! The two remote calls the add-to-cart flow needs, plus a mock for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::core::{design::Design, CoreError, CoreResult, ExternalId};

/// Server acknowledgement of a saved design
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    /// Record id assigned by the server
    pub record_id: ExternalId,
    /// When the acknowledgement was received
    pub saved_at: DateTime<Utc>,
}

/// Result of a completed add-to-cart flow
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCheckout {
    pub anonymous_uuid: Uuid,
    pub receipt: SaveReceipt,
    pub cart_url: String,
}

/// Remote persistence of designs for anonymous shoppers
#[async_trait]
pub trait DesignStore: Send + Sync {
    /// Requests a fresh anonymous session id
    async fn issue_anonymous_uuid(&self) -> CoreResult<Uuid>;

    /// Saves a design under an anonymous session id
    async fn save_design(&self, anonymous_uuid: Uuid, design: &Design) -> CoreResult<SaveReceipt>;
}

/// Builds the storefront cart link for a saved design record
pub fn cart_url(storefront_url: &str, record_id: &ExternalId) -> String {
    format!("{}/cart?id={}", storefront_url.trim_end_matches('/'), record_id)
}

/// Saves a design under a fresh anonymous id and returns the cart link.
///
/// Every failure is logged and returned; nothing is swallowed.
#[instrument(skip(store, design), fields(design_id = %design.id))]
pub async fn add_to_cart(
    store: &dyn DesignStore,
    storefront_url: &str,
    design: &Design,
) -> CoreResult<CartCheckout> {
    let anonymous_uuid = store.issue_anonymous_uuid().await.map_err(|e| {
        error!("Failed to issue anonymous id: {}", e);
        e
    })?;

    let receipt = store
        .save_design(anonymous_uuid, design)
        .await
        .map_err(|e| {
            error!(%anonymous_uuid, "Failed to save design: {}", e);
            e
        })?;

    let cart_url = cart_url(storefront_url, &receipt.record_id);
    info!(record_id = %receipt.record_id, "Design saved, cart ready");

    Ok(CartCheckout {
        anonymous_uuid,
        receipt,
        cart_url,
    })
}

// =============================================================================
// Mock Store (for testing)
// =============================================================================

/// In-memory design store that records every saved design
#[derive(Default)]
pub struct MockDesignStore {
    saved: Mutex<Vec<(Uuid, Design)>>,
    fail_uuid: bool,
    fail_save: bool,
}

impl MockDesignStore {
    /// Creates a store that accepts every design
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails anonymous id issuance
    pub fn failing_uuid(mut self) -> Self {
        self.fail_uuid = true;
        self
    }

    /// Fails design saves
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Returns the saved designs in save order
    pub fn saved(&self) -> Vec<(Uuid, Design)> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DesignStore for MockDesignStore {
    async fn issue_anonymous_uuid(&self) -> CoreResult<Uuid> {
        if self.fail_uuid {
            return Err(CoreError::RemoteServiceFailed(
                "Failed to get UUID".to_string(),
            ));
        }
        Ok(Uuid::new_v4())
    }

    async fn save_design(&self, anonymous_uuid: Uuid, design: &Design) -> CoreResult<SaveReceipt> {
        if self.fail_save {
            return Err(CoreError::RemoteServiceFailed(
                "Failed to save design".to_string(),
            ));
        }

        let mut saved = self
            .saved
            .lock()
            .map_err(|_| CoreError::Internal("Mock store lock poisoned".to_string()))?;
        saved.push((anonymous_uuid, design.clone()));

        Ok(SaveReceipt {
            record_id: ExternalId::Number(saved.len() as i64),
            saved_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::design::{DesignHeader, DesignType, Scene};
    use crate::core::Frame;

    fn design() -> Design {
        DesignHeader::new(DesignType::Graphic, "Cart", Frame::new(300.0, 200.0))
            .with_scenes(vec![Scene::new("s1")])
    }

    #[test]
    fn test_cart_url() {
        assert_eq!(
            cart_url("https://shop.example.com/", &ExternalId::Number(42)),
            "https://shop.example.com/cart?id=42"
        );
        assert_eq!(
            cart_url("https://shop.example.com", &ExternalId::from("abc")),
            "https://shop.example.com/cart?id=abc"
        );
    }

    #[tokio::test]
    async fn test_add_to_cart_saves_and_links() {
        let store = MockDesignStore::new();
        let doc = design();

        let checkout = add_to_cart(&store, "https://shop.example.com", &doc)
            .await
            .unwrap();

        assert_eq!(checkout.cart_url, "https://shop.example.com/cart?id=1");
        assert_eq!(checkout.receipt.record_id, ExternalId::Number(1));

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, checkout.anonymous_uuid);
        assert_eq!(saved[0].1, doc);
    }

    #[tokio::test]
    async fn test_add_to_cart_surfaces_uuid_failure() {
        let store = MockDesignStore::new().failing_uuid();

        let err = add_to_cart(&store, "https://shop.example.com", &design())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RemoteServiceFailed(_)));
        assert!(store.saved().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_cart_surfaces_save_failure() {
        let store = MockDesignStore::new().failing_save();

        let err = add_to_cart(&store, "https://shop.example.com", &design())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RemoteServiceFailed(ref m) if m.contains("save")));
        assert!(store.saved().is_empty());
    }
}
