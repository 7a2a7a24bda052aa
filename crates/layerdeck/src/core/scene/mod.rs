//! Scene Snapshot Module
//!
//! Reads the scene currently open in the live editor and normalizes it into a
//! persisted [`Scene`] record.

use crate::core::{
    design::{Layer, Scene},
    DurationMs, SceneId,
};

// =============================================================================
// Editor Scene Handle
// =============================================================================

/// Read-only view of the scene open in the live editor
pub trait EditorScene {
    /// Identity of the open scene
    fn scene_id(&self) -> &str;

    /// Display name, if the editor has one
    fn scene_name(&self) -> Option<&str>;

    /// Current on-canvas layer stack, bottom to top
    fn layers(&self) -> &[Layer];

    /// Scene duration, for editors that expose timing
    fn duration(&self) -> Option<DurationMs> {
        None
    }
}

/// Produces a scene record reflecting the current on-canvas state.
///
/// Callers must only invoke this while the editor has an active scene.
pub fn extract_active_scene(editor: &dyn EditorScene) -> Scene {
    Scene {
        id: editor.scene_id().to_string(),
        name: editor.scene_name().map(str::to_string),
        layers: editor.layers().to_vec(),
        duration: editor.duration(),
    }
}

// =============================================================================
// Live Scene
// =============================================================================

/// In-memory canvas state for the active scene
#[derive(Clone, Debug, PartialEq)]
pub struct LiveScene {
    pub id: SceneId,
    pub name: Option<String>,
    pub layers: Vec<Layer>,
    pub duration: Option<DurationMs>,
}

impl LiveScene {
    /// Opens a stored scene in the editor
    pub fn open(scene: &Scene) -> Self {
        Self {
            id: scene.id.clone(),
            name: scene.name.clone(),
            layers: scene.layers.clone(),
            duration: scene.duration,
        }
    }

    /// Adds a layer on top of the stack
    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Removes a layer by id, returning it if present
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Layer> {
        let index = self.layers.iter().position(|l| l.id == layer_id)?;
        Some(self.layers.remove(index))
    }

    /// Renames the scene
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }
}

impl EditorScene for LiveScene {
    fn scene_id(&self) -> &str {
        &self.id
    }

    fn scene_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn duration(&self) -> Option<DurationMs> {
        self.duration
    }
}
