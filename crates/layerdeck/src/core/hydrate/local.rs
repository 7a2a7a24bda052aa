//! Local Reference Collaborators
//!
//! Minimal collaborator implementations that let the pipeline run outside the
//! editor: filesystem asset resolution, a font registry and a wireframe SVG
//! preview renderer.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{
    design::{Layer, RenderScene},
    CoreError, CoreResult, Metadata,
};

use super::{AssetResolver, FontLoader, PreviewRenderer};

// =============================================================================
// Asset Resolver
// =============================================================================

/// Schemes the renderer fetches by itself
const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "data:", "blob:"];

/// Resolves relative `src` references against a local asset root
#[derive(Clone, Debug)]
pub struct LocalAssetResolver {
    root: PathBuf,
}

impl LocalAssetResolver {
    /// Creates a resolver rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_blocking(&self, mut scene: RenderScene) -> CoreResult<RenderScene> {
        for layer in &mut scene.layers {
            self.resolve_props(&scene.id, &mut layer.props)?;
        }
        Ok(scene)
    }

    fn resolve_props(&self, scene_id: &str, props: &mut Metadata) -> CoreResult<()> {
        if let Some(src) = props.get("src").and_then(Value::as_str).map(str::to_string) {
            if let Some(resolved) = self.resolve_src(scene_id, &src)? {
                props.insert("src".to_string(), Value::String(resolved));
            }
        }

        if let Some(Value::Array(children)) = props.get_mut("objects") {
            for child in children.iter_mut() {
                if let Value::Object(child_props) = child {
                    self.resolve_props(scene_id, child_props)?;
                }
            }
        }

        Ok(())
    }

    /// Returns the rewritten reference, or `None` when it is left untouched
    fn resolve_src(&self, scene_id: &str, src: &str) -> CoreResult<Option<String>> {
        let lower = src.to_ascii_lowercase();
        if src.is_empty() || REMOTE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return Ok(None);
        }

        let raw = src.strip_prefix("file://").unwrap_or(src);
        let path = Path::new(raw);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        if !path.is_file() {
            return Err(CoreError::AssetResolutionFailed {
                scene_id: scene_id.to_string(),
                reason: format!("asset not found: {}", path.display()),
            });
        }

        debug!(scene_id, src, resolved = %path.display(), "Resolved local asset");
        Ok(Some(path.to_string_lossy().to_string()))
    }
}

#[async_trait]
impl AssetResolver for LocalAssetResolver {
    async fn resolve(&self, scene: RenderScene) -> CoreResult<RenderScene> {
        let resolver = self.clone();
        let scene_id = scene.id.clone();
        tokio::task::spawn_blocking(move || resolver.resolve_blocking(scene))
            .await
            .map_err(|e| CoreError::AssetResolutionFailed {
                scene_id,
                reason: format!("resolver task failed: {}", e),
            })?
    }
}

// =============================================================================
// Font Registry
// =============================================================================

/// Records the font families referenced by text layers
#[derive(Default)]
pub struct FontRegistry {
    fonts: Mutex<HashMap<String, String>>,
}

impl FontRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `family` has been registered
    pub fn is_loaded(&self, family: &str) -> bool {
        self.fonts
            .lock()
            .map(|fonts| fonts.contains_key(family))
            .unwrap_or(false)
    }

    /// Returns the source URL registered for `family`
    pub fn source_of(&self, family: &str) -> Option<String> {
        self.fonts
            .lock()
            .ok()
            .and_then(|fonts| fonts.get(family).cloned())
    }

    /// Returns every registered family, sorted
    pub fn loaded_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .fonts
            .lock()
            .map(|fonts| fonts.keys().cloned().collect())
            .unwrap_or_default();
        families.sort();
        families
    }
}

fn collect_fonts(layers: &[Layer], out: &mut Vec<(String, Option<String>)>) {
    for layer in layers {
        if let Some(family) = layer.str_prop("fontFamily") {
            let url = layer.str_prop("fontURL").map(str::to_string);
            out.push((family.to_string(), url));
        }
        collect_fonts(&layer.children(), out);
    }
}

#[async_trait]
impl FontLoader for FontRegistry {
    async fn load_fonts(&self, scene: &RenderScene) -> CoreResult<()> {
        let mut referenced = Vec::new();
        collect_fonts(&scene.layers, &mut referenced);

        let mut fonts = self.fonts.lock().map_err(|_| CoreError::FontLoadFailed {
            scene_id: scene.id.clone(),
            reason: "font registry poisoned".to_string(),
        })?;

        for (family, url) in referenced {
            match url {
                Some(url) => {
                    if fonts.get(&family) != Some(&url) {
                        debug!(scene_id = %scene.id, family = %family, url = %url, "Registered font");
                        fonts.insert(family, url);
                    }
                }
                None if !fonts.contains_key(&family) => {
                    warn!(
                        scene_id = %scene.id,
                        family = %family,
                        "Font has no source URL; relying on system fonts"
                    );
                }
                None => {}
            }
        }

        Ok(())
    }
}

// =============================================================================
// SVG Preview Renderer
// =============================================================================

/// Renders a wireframe SVG of the scene as a data URI
#[derive(Clone, Debug, Default)]
pub struct SvgPreviewRenderer;

impl SvgPreviewRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Builds the SVG markup for a scene
    pub fn render_svg(&self, scene: &RenderScene) -> String {
        let (w, h) = (scene.frame.width, scene.frame.height);
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );

        for layer in &scene.layers {
            write_layer(&mut svg, layer, w, h);
        }

        svg.push_str("</svg>");
        svg
    }
}

fn write_layer(svg: &mut String, layer: &Layer, frame_w: f64, frame_h: f64) {
    if layer.props.get("visible") == Some(&Value::Bool(false)) {
        return;
    }

    let x = layer.f64_prop("left").unwrap_or(0.0);
    let y = layer.f64_prop("top").unwrap_or(0.0);
    let w = layer.f64_prop("width").unwrap_or(frame_w) * layer.f64_prop("scaleX").unwrap_or(1.0);
    let h = layer.f64_prop("height").unwrap_or(frame_h) * layer.f64_prop("scaleY").unwrap_or(1.0);
    let opacity = layer.f64_prop("opacity").unwrap_or(1.0);
    let fill = layer.str_prop("fill").unwrap_or("none");

    match layer.layer_type() {
        Some("StaticText") | Some("DynamicText") => {
            let text = escape_xml(layer.str_prop("text").unwrap_or_default());
            let family = escape_xml(layer.str_prop("fontFamily").unwrap_or("sans-serif"));
            let size = layer.f64_prop("fontSize").unwrap_or(16.0);
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{}" font-family="{family}" font-size="{size}" fill="{}" opacity="{opacity}">{text}</text>"#,
                y + size,
                escape_xml(fill)
            );
        }
        Some("Group") => {
            for child in layer.children() {
                write_layer(svg, &child, frame_w, frame_h);
            }
        }
        _ => {
            let stroke = if fill == "none" { "#999999" } else { "none" };
            let _ = write!(
                svg,
                r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{}" stroke="{stroke}" opacity="{opacity}"/>"#,
                escape_xml(fill)
            );
        }
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Percent-encodes the characters that break an SVG data URI
fn svg_data_uri(svg: &str) -> String {
    let mut uri = String::with_capacity(svg.len() + 32);
    uri.push_str("data:image/svg+xml;charset=utf-8,");
    for c in svg.chars() {
        match c {
            '%' => uri.push_str("%25"),
            '#' => uri.push_str("%23"),
            '<' => uri.push_str("%3C"),
            '>' => uri.push_str("%3E"),
            '"' => uri.push('\''),
            '\n' | '\r' => uri.push(' '),
            _ => uri.push(c),
        }
    }
    uri
}

#[async_trait]
impl PreviewRenderer for SvgPreviewRenderer {
    async fn render(&self, scene: &RenderScene) -> CoreResult<String> {
        if !scene.frame.is_valid() {
            return Err(CoreError::RenderFailed {
                scene_id: scene.id.clone(),
                reason: format!(
                    "invalid frame {}x{}",
                    scene.frame.width, scene.frame.height
                ),
            });
        }
        Ok(svg_data_uri(&self.render_svg(scene)))
    }
}
