//! Catalog Sources
//!
//! Anything that can list products: the remote commerce service or an
//! in-memory catalog loaded from a file.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::core::{CoreError, CoreResult, ExternalId};

use super::Product;

/// Lists the products available for starter templates
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches every product in the catalog
    async fn fetch_products(&self) -> CoreResult<Vec<Product>>;

    /// Finds a single product by id
    async fn find_product(&self, id: &ExternalId) -> CoreResult<Product> {
        let wanted = id.to_string();
        self.fetch_products()
            .await?
            .into_iter()
            .find(|p| p.id.to_string() == wanted)
            .ok_or_else(|| CoreError::CatalogError(format!("Product not found: {}", id)))
    }
}

/// Parses either a bare product array or `{ "products": [...] }`
pub fn parse_product_list(value: Value) -> CoreResult<Vec<Product>> {
    let list = match value {
        Value::Object(mut map) if map.contains_key("products") => {
            map.remove("products").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(list)
        .map_err(|e| CoreError::CatalogError(format!("Invalid product list: {}", e)))
}

/// Fixed product list held in memory
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    /// Creates a catalog over the given products
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parses a catalog from a product list document
    pub fn from_value(value: Value) -> CoreResult<Self> {
        let products = parse_product_list(value)?;
        debug!(count = products.len(), "Loaded static catalog");
        Ok(Self::new(products))
    }

    /// Number of products held
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_products(&self) -> CoreResult<Vec<Product>> {
        Ok(self.products.clone())
    }
}
