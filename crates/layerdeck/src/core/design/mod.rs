//! Design Document Module
//!
//! Persisted design documents and the per-variant rules that govern them.
//!
//! # Modules
//!
//! - `models`: Design, Scene, Layer and the render-ready scene shapes
//! - `variant`: Per-variant field projection and validation policies

mod models;
mod variant;

pub use models::*;
pub use variant::*;
