//! LayerDeck Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::{design::DesignType, SceneId};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Design Errors
    // =========================================================================
    #[error("Malformed design: {0}")]
    MalformedDesign(String),

    #[error("Unsupported design type: {0}")]
    UnsupportedDesignType(String),

    #[error("Variant mismatch: design is {expected} but {requested} was requested")]
    VariantMismatch {
        expected: DesignType,
        requested: DesignType,
    },

    #[error("Scene not found: {0}")]
    SceneNotFound(SceneId),

    #[error("No active scene")]
    NoActiveScene,

    // =========================================================================
    // Hydration Errors
    // =========================================================================
    #[error("Asset resolution failed for scene {scene_id}: {reason}")]
    AssetResolutionFailed { scene_id: SceneId, reason: String },

    #[error("Font load failed for scene {scene_id}: {reason}")]
    FontLoadFailed { scene_id: SceneId, reason: String },

    #[error("Preview render failed for scene {scene_id}: {reason}")]
    RenderFailed { scene_id: SceneId, reason: String },

    // =========================================================================
    // Catalog / Remote Errors
    // =========================================================================
    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Remote service failed: {0}")]
    RemoteServiceFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns true for failures raised by a hydration collaborator
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            CoreError::AssetResolutionFailed { .. }
                | CoreError::FontLoadFailed { .. }
                | CoreError::RenderFailed { .. }
        )
    }

    /// Returns true when the input document was rejected before hydration
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            CoreError::MalformedDesign(_)
                | CoreError::UnsupportedDesignType(_)
                | CoreError::ValidationError(_)
                | CoreError::JsonError(_)
        )
    }
}
