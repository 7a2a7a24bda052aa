//! Document Importer
//!
//! Turns a persisted design of any variant into hydrated, renderer-ready
//! scenes. Each scene gets its assets resolved, its fonts loaded and a
//! preview rendered. Any collaborator failure aborts the whole import.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::core::{
    design::{Design, DesignType, HydratedScene, ImportedDesign, RenderScene, VariantPolicy},
    CoreError, CoreResult,
};

use super::{AssetResolver, FontLoader, PreviewRenderer};

// =============================================================================
// Configuration
// =============================================================================

/// Order of font loading and preview rendering within one scene
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HydrationOrder {
    /// Load fonts, then render the preview with them available
    #[default]
    FontsFirst,
    /// Render the preview, then load fonts
    PreviewFirst,
}

/// Importer configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    /// Font/preview ordering within a scene
    #[serde(default)]
    pub order: HydrationOrder,
    /// Hydrate all scenes concurrently instead of one after another.
    /// Output order is document order either way.
    #[serde(default)]
    pub concurrent: bool,
}

// =============================================================================
// Importer
// =============================================================================

/// Hydrates persisted designs using injected collaborators
pub struct DesignImporter {
    assets: Arc<dyn AssetResolver>,
    fonts: Arc<dyn FontLoader>,
    renderer: Arc<dyn PreviewRenderer>,
    config: ImportConfig,
}

impl DesignImporter {
    /// Creates an importer with the default configuration
    pub fn new(
        assets: Arc<dyn AssetResolver>,
        fonts: Arc<dyn FontLoader>,
        renderer: Arc<dyn PreviewRenderer>,
    ) -> Self {
        Self {
            assets,
            fonts,
            renderer,
            config: ImportConfig::default(),
        }
    }

    /// Sets the importer configuration
    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parses, validates and imports a design from JSON text
    pub async fn import_str(&self, json: &str) -> CoreResult<ImportedDesign> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::MalformedDesign(format!("Invalid JSON: {}", e)))?;
        self.import_value(value).await
    }

    /// Validates and imports a design from an untyped JSON value.
    ///
    /// The declared `type` is checked before the shape, so an unknown variant
    /// is reported as such rather than as a generic parse error.
    pub async fn import_value(&self, value: Value) -> CoreResult<ImportedDesign> {
        let design = parse_design(value)?;
        self.import(design).await
    }

    /// Imports a typed design
    #[instrument(skip(self, design), fields(design_id = %design.id, kind = %design.kind))]
    pub async fn import(&self, design: Design) -> CoreResult<ImportedDesign> {
        let policy = VariantPolicy::for_type(design.kind);
        policy.validate_design(&design)?;

        let (header, scenes) = design.into_parts();
        info!(scene_count = scenes.len(), "Importing design");

        let render_scenes: Vec<RenderScene> = scenes
            .into_iter()
            .map(|scene| policy.render_scene(scene, &header.frame))
            .collect();

        let hydrated = if self.config.concurrent {
            try_join_all(render_scenes.into_iter().map(|s| self.hydrate_scene(s))).await?
        } else {
            let mut hydrated = Vec::with_capacity(render_scenes.len());
            for scene in render_scenes {
                hydrated.push(self.hydrate_scene(scene).await?);
            }
            hydrated
        };

        info!(scene_count = hydrated.len(), "Design imported");
        Ok(ImportedDesign {
            scenes: hydrated,
            design: header,
        })
    }

    async fn hydrate_scene(&self, scene: RenderScene) -> CoreResult<HydratedScene> {
        debug!(scene_id = %scene.id, "Hydrating scene");
        let scene = self.assets.resolve(scene).await?;

        let preview = match self.config.order {
            HydrationOrder::FontsFirst => {
                self.fonts.load_fonts(&scene).await?;
                self.renderer.render(&scene).await?
            }
            HydrationOrder::PreviewFirst => {
                let preview = self.renderer.render(&scene).await?;
                self.fonts.load_fonts(&scene).await?;
                preview
            }
        };

        Ok(HydratedScene { scene, preview })
    }
}

/// Validates the declared variant of an untyped document, then its shape
pub fn parse_design(mut value: Value) -> CoreResult<Design> {
    let declared = value
        .get("type")
        .ok_or_else(|| CoreError::MalformedDesign("Design has no `type` field".to_string()))?;
    let declared = declared.as_str().ok_or_else(|| {
        CoreError::MalformedDesign(format!("Design `type` must be a string, got {}", declared))
    })?;

    let kind: DesignType = declared.parse()?;
    debug!(kind = %kind, "Recognized design type");
    value["type"] = Value::String(kind.as_str().to_string());

    serde_json::from_value(value).map_err(|e| CoreError::MalformedDesign(e.to_string()))
}
