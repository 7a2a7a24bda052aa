//! LayerDeck Core
//!
//! Design document pipeline: scene snapshots, document assembly, import
//! hydration, product templates and the supporting session, storage and
//! remote plumbing.

pub mod assemble;
pub mod catalog;
pub mod design;
pub mod fs;
pub mod hydrate;
pub mod remote;
pub mod scene;
pub mod session;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_destructive;
