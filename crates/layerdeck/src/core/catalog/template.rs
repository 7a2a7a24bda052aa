//! Catalog-to-Template Adapter
//!
//! Turns a product into a one-layer starter scene sized to the product.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::core::{
    design::{Layer, Scene},
    CoreResult, Frame, Metadata, SceneId,
};

use super::Product;

/// Id of the synthesized background layer
pub const BACKGROUND_LAYER_ID: &str = "background";

/// Layer type of the synthesized background layer
pub const BACKGROUND_LAYER_TYPE: &str = "Background";

/// Fill of the synthesized background layer
pub const BACKGROUND_FILL: &str = "#ffffff";

/// Full-canvas background layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundLayer {
    pub id: String,
    pub name: String,
    pub angle: f64,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    #[serde(rename = "originX")]
    pub origin_x: String,
    #[serde(rename = "originY")]
    pub origin_y: String,
    #[serde(rename = "scaleX")]
    pub scale_x: f64,
    #[serde(rename = "scaleY")]
    pub scale_y: f64,
    #[serde(rename = "type")]
    pub layer_type: String,
    #[serde(rename = "flipX")]
    pub flip_x: bool,
    #[serde(rename = "flipY")]
    pub flip_y: bool,
    #[serde(rename = "skewX")]
    pub skew_x: f64,
    #[serde(rename = "skewY")]
    pub skew_y: f64,
    pub visible: bool,
    pub shadow: Option<Value>,
    pub fill: String,
}

impl BackgroundLayer {
    /// White background covering a `width` x `height` canvas
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            id: BACKGROUND_LAYER_ID.to_string(),
            name: "Initial Frame".to_string(),
            angle: 0.0,
            stroke: None,
            stroke_width: 0.0,
            left: 0.0,
            top: 0.0,
            width,
            height,
            opacity: 1.0,
            origin_x: "left".to_string(),
            origin_y: "top".to_string(),
            scale_x: 1.0,
            scale_y: 1.0,
            layer_type: BACKGROUND_LAYER_TYPE.to_string(),
            flip_x: false,
            flip_y: false,
            skew_x: 0.0,
            skew_y: 0.0,
            visible: true,
            shadow: None,
            fill: BACKGROUND_FILL.to_string(),
        }
    }

    /// Converts into an opaque layer
    pub fn into_layer(self) -> CoreResult<Layer> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

/// Single-scene starter document built from a product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarterTemplate {
    /// Forced to the caller's active scene id, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SceneId>,
    pub name: String,
    pub layers: Vec<Layer>,
    pub frame: Frame,
    pub preview: String,
    pub metadata: Metadata,
}

impl StarterTemplate {
    /// Converts into a scene record, using `fallback_id` when no id was forced
    pub fn into_scene(self, fallback_id: impl Into<SceneId>) -> Scene {
        Scene {
            id: self.id.unwrap_or_else(|| fallback_id.into()),
            name: Some(self.name),
            layers: self.layers,
            duration: None,
        }
    }
}

/// Maps a product onto a starter template.
///
/// The template takes `active_scene_id` as its identity so that committing it
/// updates the open scene instead of inserting a new one.
pub fn product_to_template(
    product: &Product,
    active_scene_id: Option<&str>,
) -> CoreResult<StarterTemplate> {
    let (width, height) = product.dimensions()?;
    let background = BackgroundLayer::sized(width, height).into_layer()?;

    let mut metadata = Metadata::new();
    metadata.insert("animated".to_string(), json!(false));

    debug!(
        product_id = %product.id,
        width,
        height,
        active_scene_id = ?active_scene_id,
        "Built starter template from product"
    );

    Ok(StarterTemplate {
        id: active_scene_id.map(str::to_string),
        name: product.name.clone(),
        layers: vec![background],
        frame: Frame { width, height },
        preview: product.image1.clone(),
        metadata,
    })
}
