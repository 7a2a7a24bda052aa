//! Hydration Module
//!
//! Re-hydrates persisted designs into renderer-ready scenes.
//!
//! # Modules
//!
//! - `provider`: Collaborator traits (assets, fonts, preview) and test mocks
//! - `importer`: Variant-aware import pipeline
//! - `local`: Local reference collaborators

pub mod importer;
pub mod local;
pub mod provider;

pub use importer::{parse_design, DesignImporter, HydrationOrder, ImportConfig};
pub use local::{FontRegistry, LocalAssetResolver, SvgPreviewRenderer};
pub use provider::{AssetResolver, FontLoader, MockCollaborators, MockStage, PreviewRenderer};
