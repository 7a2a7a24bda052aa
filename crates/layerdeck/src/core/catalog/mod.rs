//! Product Catalog
//!
//! Product records, catalog sources and the product-to-template adapter.

mod models;
mod source;
mod template;

pub use models::*;
pub use source::*;
pub use template::*;
