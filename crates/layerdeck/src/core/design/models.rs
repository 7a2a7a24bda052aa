//! Design Models
//!
//! Persisted design documents, their scenes and the opaque layer payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::{
    new_id, CoreError, DesignId, DurationMs, Frame, LayerId, Metadata, SceneId,
};

// =============================================================================
// Design Type
// =============================================================================

/// Document variant; decides which scene fields are mandatory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DesignType {
    /// Single or multi-page static graphic
    Graphic,
    /// Slides with a fixed per-scene duration
    Presentation,
    /// Timed scenes, each with its own duration
    Video,
}

impl DesignType {
    /// All known variants
    pub const ALL: [DesignType; 3] = [
        DesignType::Graphic,
        DesignType::Presentation,
        DesignType::Video,
    ];

    /// Wire name of the variant
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignType::Graphic => "GRAPHIC",
            DesignType::Presentation => "PRESENTATION",
            DesignType::Video => "VIDEO",
        }
    }
}

impl fmt::Display for DesignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DesignType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnsupportedDesignType(s.to_string()))
    }
}

// =============================================================================
// Layer
// =============================================================================

/// A single visual element within a scene.
///
/// Only the identity is typed; every other property is carried through
/// untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    #[serde(flatten)]
    pub props: Metadata,
}

impl Layer {
    /// Creates a layer with no properties besides its id
    pub fn new(id: impl Into<LayerId>) -> Self {
        Self {
            id: id.into(),
            props: Metadata::new(),
        }
    }

    /// Sets a property
    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// Returns the layer `type` property, if any
    pub fn layer_type(&self) -> Option<&str> {
        self.props.get("type").and_then(Value::as_str)
    }

    /// Returns a string property
    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Returns a numeric property
    pub fn f64_prop(&self, key: &str) -> Option<f64> {
        self.props.get(key).and_then(Value::as_f64)
    }

    /// Returns nested child layers (group layers keep them under `objects`)
    pub fn children(&self) -> Vec<Layer> {
        self.props
            .get("objects")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| match serde_json::from_value(item.clone()) {
                        Ok(child) => Some(child),
                        Err(e) => {
                            warn!(
                                layer_id = %self.id,
                                index,
                                error = %e,
                                "Skipping malformed child layer"
                            );
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// =============================================================================
// Scene
// =============================================================================

/// One canvas worth of layers plus optional timing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Duration in milliseconds (VIDEO and PRESENTATION only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationMs>,
}

impl Scene {
    /// Creates an empty scene with the given id
    pub fn new(id: impl Into<SceneId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            layers: Vec::new(),
            duration: None,
        }
    }

    /// Creates an empty scene with a freshly generated id
    pub fn untitled() -> Self {
        Self::new(new_id())
    }

    /// Sets the scene name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the layer stack
    pub fn with_layers(mut self, layers: Vec<Layer>) -> Self {
        self.layers = layers;
        self
    }

    /// Sets the duration
    pub fn with_duration(mut self, duration: DurationMs) -> Self {
        self.duration = Some(duration);
        self
    }
}

// =============================================================================
// Design
// =============================================================================

/// Document fields shared by every scene: everything but the scene list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignHeader {
    pub id: DesignId,
    #[serde(rename = "type")]
    pub kind: DesignType,
    pub name: String,
    pub frame: Frame,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub preview: String,
}

impl DesignHeader {
    /// Creates a header for a brand new design
    pub fn new(kind: DesignType, name: impl Into<String>, frame: Frame) -> Self {
        Self {
            id: new_id(),
            kind,
            name: name.into(),
            frame,
            metadata: Metadata::new(),
            preview: String::new(),
        }
    }

    /// Reattaches a scene list
    pub fn with_scenes(self, scenes: Vec<Scene>) -> Design {
        Design {
            id: self.id,
            kind: self.kind,
            name: self.name,
            frame: self.frame,
            scenes,
            metadata: self.metadata,
            preview: self.preview,
        }
    }
}

/// Persisted multi-scene design document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub id: DesignId,
    #[serde(rename = "type")]
    pub kind: DesignType,
    pub name: String,
    pub frame: Frame,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub preview: String,
}

impl Design {
    /// Splits the document into its header and scene list
    pub fn into_parts(self) -> (DesignHeader, Vec<Scene>) {
        let header = DesignHeader {
            id: self.id,
            kind: self.kind,
            name: self.name,
            frame: self.frame,
            metadata: self.metadata,
            preview: self.preview,
        };
        (header, self.scenes)
    }

    /// Returns the header without consuming the design
    pub fn header(&self) -> DesignHeader {
        DesignHeader {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name.clone(),
            frame: self.frame,
            metadata: self.metadata.clone(),
            preview: self.preview.clone(),
        }
    }

    /// Returns the scene ids in document order
    pub fn scene_ids(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.id.as_str()).collect()
    }

    /// Finds a scene by id
    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }
}

// =============================================================================
// Render-ready Scenes
// =============================================================================

/// Scene shape handed to the renderer: a scene plus the shared frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderScene {
    pub id: SceneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub frame: Frame,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationMs>,
}

/// Fully hydrated scene: assets resolved, fonts loaded, preview rendered
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HydratedScene {
    #[serde(flatten)]
    pub scene: RenderScene,
    pub preview: String,
}

impl HydratedScene {
    /// Returns the persisted scene record, dropping frame and preview
    pub fn to_scene(&self) -> Scene {
        Scene {
            id: self.scene.id.clone(),
            name: self.scene.name.clone(),
            layers: self.scene.layers.clone(),
            duration: self.scene.duration,
        }
    }
}

/// Result of an import: hydrated scenes plus the design stripped of scenes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportedDesign {
    pub scenes: Vec<HydratedScene>,
    pub design: DesignHeader,
}

impl ImportedDesign {
    /// Returns the hydrated scene ids in order
    pub fn scene_ids(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.scene.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_design_type_serialization() {
        assert_eq!(
            serde_json::to_string(&DesignType::Presentation).unwrap(),
            "\"PRESENTATION\""
        );
        let kind: DesignType = serde_json::from_str("\"VIDEO\"").unwrap();
        assert_eq!(kind, DesignType::Video);
        assert!(serde_json::from_str::<DesignType>("\"AUDIO\"").is_err());
    }

    #[test]
    fn test_design_type_from_str() {
        assert_eq!("graphic".parse::<DesignType>().unwrap(), DesignType::Graphic);
        assert!(matches!(
            "poster".parse::<DesignType>(),
            Err(CoreError::UnsupportedDesignType(_))
        ));
    }

    #[test]
    fn test_layer_props_pass_through() {
        let raw = json!({
            "id": "title",
            "type": "StaticText",
            "text": "Hello",
            "fontFamily": "Inter",
            "left": 12.5
        });

        let layer: Layer = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(layer.id, "title");
        assert_eq!(layer.layer_type(), Some("StaticText"));
        assert_eq!(layer.f64_prop("left"), Some(12.5));
        assert_eq!(serde_json::to_value(&layer).unwrap(), raw);
    }

    #[test]
    fn test_layer_children() {
        let group = Layer::new("group").with_prop(
            "objects",
            json!([{ "id": "a", "type": "StaticImage" }, { "id": "b" }]),
        );
        let children = group.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].layer_type(), Some("StaticImage"));
    }

    #[test]
    fn test_layer_children_skips_child_without_id() {
        let group = Layer::new("group").with_prop(
            "objects",
            json!([{ "id": "a" }, { "type": "StaticText" }, "junk", { "id": "c" }]),
        );
        let ids: Vec<_> = group.children().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_scene_serialization_skips_missing_fields() {
        let scene = Scene::new("s1").with_layers(vec![Layer::new("l1")]);
        let json = serde_json::to_value(&scene).unwrap();

        assert_eq!(json, json!({ "id": "s1", "layers": [{ "id": "l1" }] }));
    }

    #[test]
    fn test_design_parse_and_split() {
        let raw = json!({
            "id": "d1",
            "type": "GRAPHIC",
            "name": "Poster",
            "frame": { "width": 1200, "height": 800 },
            "scenes": [{ "id": "s1", "name": "Front", "layers": [] }],
            "metadata": {},
            "preview": ""
        });

        let design: Design = serde_json::from_value(raw).unwrap();
        assert_eq!(design.kind, DesignType::Graphic);
        assert_eq!(design.frame, Frame::new(1200.0, 800.0));
        assert_eq!(design.scene_ids(), vec!["s1"]);

        let (header, scenes) = design.clone().into_parts();
        assert_eq!(header, design.header());
        assert_eq!(header.with_scenes(scenes), design);
    }

    #[test]
    fn test_design_defaults_metadata_and_preview() {
        let raw = json!({
            "id": "d1",
            "type": "VIDEO",
            "name": "Clip",
            "frame": { "width": 10, "height": 10 },
            "scenes": []
        });

        let design: Design = serde_json::from_value(raw).unwrap();
        assert!(design.metadata.is_empty());
        assert_eq!(design.preview, "");
    }

    #[test]
    fn test_hydrated_scene_flattens_render_scene() {
        let hydrated = HydratedScene {
            scene: RenderScene {
                id: "s1".to_string(),
                name: Some("One".to_string()),
                frame: Frame::new(100.0, 50.0),
                layers: vec![],
                metadata: Metadata::new(),
                duration: Some(3000.0),
            },
            preview: "data:image/svg+xml,".to_string(),
        };

        let json = serde_json::to_value(&hydrated).unwrap();
        assert_eq!(json["id"], "s1");
        assert_eq!(json["duration"], 3000.0);
        assert_eq!(json["preview"], "data:image/svg+xml,");

        let scene = hydrated.to_scene();
        assert_eq!(scene.duration, Some(3000.0));
        assert_eq!(scene.name.as_deref(), Some("One"));
    }
}
