//! Hydration Collaborator Traits
//!
//! Defines the interfaces the importer calls into while hydrating a scene.
//! Implementations include the local reference collaborators and the mocks
//! used in tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::{design::RenderScene, CoreError, CoreResult};

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Fetches or inlines the external media referenced by a scene's layers
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Returns the scene with every external layer reference resolved
    async fn resolve(&self, scene: RenderScene) -> CoreResult<RenderScene>;
}

/// Makes the fonts referenced by a scene available to the renderer
#[async_trait]
pub trait FontLoader: Send + Sync {
    /// Loads every font the scene references
    async fn load_fonts(&self, scene: &RenderScene) -> CoreResult<()>;
}

/// Renders a string-encoded preview of a scene
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    /// Renders the scene preview (usually a data URI)
    async fn render(&self, scene: &RenderScene) -> CoreResult<String>;
}

// =============================================================================
// Mock Collaborators (for testing)
// =============================================================================

/// Which collaborator call a mock should fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockStage {
    Assets,
    Fonts,
    Render,
}

/// Mock implementing all three collaborators and recording every call
#[derive(Default)]
pub struct MockCollaborators {
    calls: Mutex<Vec<String>>,
    fail_at: Option<(MockStage, String)>,
}

impl MockCollaborators {
    /// Creates a mock that succeeds for every scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the given stage when it is called for `scene_id`
    pub fn failing_at(mut self, stage: MockStage, scene_id: &str) -> Self {
        self.fail_at = Some((stage, scene_id.to_string()));
        self
    }

    /// Returns the recorded calls as `"<stage>:<scene id>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, stage: MockStage, scene_id: &str) -> CoreResult<()> {
        let label = match stage {
            MockStage::Assets => "assets",
            MockStage::Fonts => "fonts",
            MockStage::Render => "render",
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{label}:{scene_id}"));
        }

        match &self.fail_at {
            Some((failing, id)) if *failing == stage && id == scene_id => {
                let scene_id = scene_id.to_string();
                let reason = "mock failure".to_string();
                Err(match stage {
                    MockStage::Assets => CoreError::AssetResolutionFailed { scene_id, reason },
                    MockStage::Fonts => CoreError::FontLoadFailed { scene_id, reason },
                    MockStage::Render => CoreError::RenderFailed { scene_id, reason },
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AssetResolver for MockCollaborators {
    async fn resolve(&self, mut scene: RenderScene) -> CoreResult<RenderScene> {
        self.record(MockStage::Assets, &scene.id)?;
        scene
            .metadata
            .insert("assetsResolved".to_string(), serde_json::Value::Bool(true));
        Ok(scene)
    }
}

#[async_trait]
impl FontLoader for MockCollaborators {
    async fn load_fonts(&self, scene: &RenderScene) -> CoreResult<()> {
        self.record(MockStage::Fonts, &scene.id)
    }
}

#[async_trait]
impl PreviewRenderer for MockCollaborators {
    async fn render(&self, scene: &RenderScene) -> CoreResult<String> {
        self.record(MockStage::Render, &scene.id)?;
        let resolved = scene.metadata.contains_key("assetsResolved");
        Ok(format!("preview:{}:{}", scene.id, resolved))
    }
}
