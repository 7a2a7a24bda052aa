//! Remote Commerce Service
//!
//! Saving designs against an anonymous session and handing them to the
//! storefront cart.

mod client;
mod store;

pub use client::*;
pub use store::*;
