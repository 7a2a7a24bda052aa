//! LayerDeck Library
//!
//! Reconciles the live editor state of a multi-scene visual design with its
//! persisted document form.

pub mod core;
pub mod logging;
