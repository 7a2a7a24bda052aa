//! Editor Session
//!
//! Holds the state the editor works against: the current design header, the
//! ordered scene collection, rendered previews and the live active scene.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::core::{
    assemble::assemble_design,
    catalog::StarterTemplate,
    design::{Design, DesignHeader, DesignType, ImportedDesign, Scene, VariantPolicy},
    new_id,
    scene::{extract_active_scene, LiveScene},
    CoreError, CoreResult, Frame, SceneId,
};

/// Editing session over a single design
#[derive(Clone, Debug)]
pub struct EditorSession {
    kind: DesignType,
    current: Option<DesignHeader>,
    scenes: Vec<Scene>,
    previews: HashMap<SceneId, String>,
    live: Option<LiveScene>,
}

impl EditorSession {
    /// Creates an empty session for the given variant
    pub fn new(kind: DesignType) -> Self {
        Self {
            kind,
            current: None,
            scenes: Vec::new(),
            previews: HashMap::new(),
            live: None,
        }
    }

    /// Opens a persisted design without hydrating it, first scene active
    pub fn from_design(design: Design) -> Self {
        let kind = design.kind;
        let (header, scenes) = design.into_parts();
        Self {
            kind,
            current: Some(header),
            live: scenes.first().map(LiveScene::open),
            scenes,
            previews: HashMap::new(),
        }
    }

    /// Starts a blank design with a single untitled scene open
    pub fn create_design(&mut self, name: &str, frame: Frame) -> &DesignHeader {
        let scene = self.new_scene(Scene::untitled());
        self.live = Some(LiveScene::open(&scene));
        self.scenes = vec![scene];
        self.previews.clear();
        self.current.insert(DesignHeader::new(self.kind, name, frame))
    }

    /// Gives a scene created in this session the variant's starting duration
    fn new_scene(&self, mut scene: Scene) -> Scene {
        if scene.duration.is_none() {
            scene.duration = VariantPolicy::for_type(self.kind).default_duration();
        }
        scene
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn kind(&self) -> DesignType {
        self.kind
    }

    pub fn current_design(&self) -> Option<&DesignHeader> {
        self.current.as_ref()
    }

    /// Stored scenes in document order
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Rendered preview of a scene, if one is known
    pub fn preview(&self, scene_id: &str) -> Option<&str> {
        self.previews.get(scene_id).map(String::as_str)
    }

    pub fn active_scene_id(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.id.as_str())
    }

    /// Mutable access to the live canvas
    pub fn live_scene_mut(&mut self) -> Option<&mut LiveScene> {
        self.live.as_mut()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Assembles the design for export.
    ///
    /// `Ok(None)` means there is no current design yet.
    pub fn export_design(&self) -> CoreResult<Option<Design>> {
        if self.current.is_none() {
            return Ok(None);
        }
        let live = self.live.as_ref().ok_or(CoreError::NoActiveScene)?;
        let active = extract_active_scene(live);
        assemble_design(self.kind, &active, &self.scenes, self.current.as_ref())
    }

    /// Replaces the session with an imported design, opening its first scene
    pub fn apply_import(&mut self, imported: ImportedDesign) {
        self.kind = imported.design.kind;
        self.previews = imported
            .scenes
            .iter()
            .map(|s| (s.scene.id.clone(), s.preview.clone()))
            .collect();
        self.scenes = imported.scenes.iter().map(|s| s.to_scene()).collect();
        self.live = self.scenes.first().map(LiveScene::open);
        self.current = Some(imported.design);

        info!(
            kind = %self.kind,
            scene_count = self.scenes.len(),
            "Applied imported design"
        );
    }

    /// Writes the live canvas back into the stored scene collection
    pub fn commit_active(&mut self) {
        let Some(live) = self.live.as_ref() else {
            return;
        };
        let fresh = extract_active_scene(live);

        match self.scenes.iter_mut().find(|s| s.id == fresh.id) {
            Some(stored) => {
                stored.name = fresh.name;
                stored.layers = fresh.layers;
                if fresh.duration.is_some() {
                    stored.duration = fresh.duration;
                }
            }
            None => {
                warn!(scene_id = %fresh.id, "Active scene missing from session, appending");
                self.scenes.push(fresh);
            }
        }
    }

    /// Commits the live canvas and opens another stored scene
    pub fn activate_scene(&mut self, scene_id: &str) -> CoreResult<()> {
        let scene = self
            .scenes
            .iter()
            .find(|s| s.id == scene_id)
            .cloned()
            .ok_or_else(|| CoreError::SceneNotFound(scene_id.to_string()))?;

        self.commit_active();
        self.live = Some(LiveScene::open(&scene));
        debug!(scene_id, "Activated scene");
        Ok(())
    }

    /// Loads a starter template into the session.
    ///
    /// A template carrying the active scene's id replaces that scene's content
    /// in place; otherwise the template is appended as a new scene. The design
    /// frame follows the template.
    pub fn apply_template(&mut self, template: StarterTemplate) -> SceneId {
        let frame = template.frame;
        let preview = template.preview.clone();
        let name = template.name.clone();
        let scene = self.new_scene(template.into_scene(new_id()));

        match self.scenes.iter_mut().find(|s| s.id == scene.id) {
            Some(stored) => {
                stored.name = scene.name.clone();
                stored.layers = scene.layers.clone();
            }
            None => self.scenes.push(scene.clone()),
        }

        match self.current.as_mut() {
            Some(current) => current.frame = frame,
            None => self.current = Some(DesignHeader::new(self.kind, name, frame)),
        }

        let scene_id = scene.id.clone();
        let opened = self
            .scenes
            .iter()
            .find(|s| s.id == scene_id)
            .map(LiveScene::open)
            .unwrap_or_else(|| LiveScene::open(&scene));
        self.live = Some(opened);
        if !preview.is_empty() {
            self.previews.insert(scene_id.clone(), preview);
        }

        info!(scene_id = %scene_id, width = frame.width, height = frame.height, "Applied template");
        scene_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{product_to_template, Dimension, Product};
    use crate::core::design::{HydratedScene, Layer, RenderScene};
    use crate::core::{ExternalId, Metadata};

    fn product() -> Product {
        Product {
            id: ExternalId::Number(3),
            name: "Sticker".to_string(),
            image1: "https://img.example.com/sticker.png".to_string(),
            max_width: Dimension::Number(40.0),
            max_height: Dimension::Text("30".to_string()),
            size: "Centimeter".to_string(),
        }
    }

    fn imported(kind: DesignType, ids: &[&str]) -> ImportedDesign {
        let frame = Frame::new(640.0, 480.0);
        ImportedDesign {
            scenes: ids
                .iter()
                .map(|id| HydratedScene {
                    scene: RenderScene {
                        id: id.to_string(),
                        name: Some(format!("Scene {id}")),
                        frame,
                        layers: vec![Layer::new(format!("{id}-bg"))],
                        metadata: Metadata::new(),
                        duration: Some(2000.0),
                    },
                    preview: format!("preview-{id}"),
                })
                .collect(),
            design: DesignHeader::new(kind, "Imported", frame),
        }
    }

    #[test]
    fn test_export_without_design_is_none() {
        let session = EditorSession::new(DesignType::Graphic);
        assert!(session.export_design().unwrap().is_none());
    }

    #[test]
    fn test_from_design_round_trips() {
        let design = DesignHeader::new(DesignType::Video, "Reel", Frame::new(1080.0, 1920.0))
            .with_scenes(vec![
                Scene::new("a").with_name("Intro").with_duration(1200.0),
                Scene::new("b").with_name("Outro").with_duration(800.0),
            ]);

        let session = EditorSession::from_design(design.clone());

        assert_eq!(session.active_scene_id(), Some("a"));
        assert_eq!(session.export_design().unwrap().unwrap(), design);
    }

    #[test]
    fn test_create_design_then_export() {
        let mut session = EditorSession::new(DesignType::Graphic);
        session.create_design("Blank", Frame::new(500.0, 500.0));
        session
            .live_scene_mut()
            .unwrap()
            .push_layer(Layer::new("text-1").with_prop("type", "StaticText"));

        let design = session.export_design().unwrap().unwrap();

        assert_eq!(design.name, "Blank");
        assert_eq!(design.scenes.len(), 1);
        assert_eq!(design.scenes[0].layers[0].id, "text-1");
    }

    #[test]
    fn test_apply_import_opens_first_scene() {
        let mut session = EditorSession::new(DesignType::Graphic);
        session.apply_import(imported(DesignType::Video, &["a", "b"]));

        assert_eq!(session.kind(), DesignType::Video);
        assert_eq!(session.active_scene_id(), Some("a"));
        assert_eq!(session.preview("b"), Some("preview-b"));
        assert_eq!(session.scenes().len(), 2);

        let design = session.export_design().unwrap().unwrap();
        assert_eq!(design.scene_ids(), vec!["a", "b"]);
        assert_eq!(design.scenes[1].duration, Some(2000.0));
    }

    #[test]
    fn test_activate_scene_commits_edits() {
        let mut session = EditorSession::new(DesignType::Graphic);
        session.apply_import(imported(DesignType::Graphic, &["a", "b"]));

        session.live_scene_mut().unwrap().rename("Edited");
        session.activate_scene("b").unwrap();

        assert_eq!(session.active_scene_id(), Some("b"));
        assert_eq!(session.scenes()[0].name.as_deref(), Some("Edited"));

        let err = session.activate_scene("zzz").unwrap_err();
        assert!(matches!(err, CoreError::SceneNotFound(ref id) if id == "zzz"));
        assert_eq!(session.active_scene_id(), Some("b"));
    }

    #[test]
    fn test_apply_template_replaces_active_scene() {
        let mut session = EditorSession::new(DesignType::Graphic);
        session.apply_import(imported(DesignType::Graphic, &["a", "b"]));

        let template = product_to_template(&product(), session.active_scene_id()).unwrap();
        let id = session.apply_template(template);

        assert_eq!(id, "a");
        assert_eq!(session.scenes().len(), 2);
        assert_eq!(session.scenes()[0].layers[0].id, "background");
        assert_eq!(session.current_design().unwrap().frame, Frame::new(40.0, 30.0));
        assert_eq!(session.preview("a"), Some("https://img.example.com/sticker.png"));

        let design = session.export_design().unwrap().unwrap();
        assert_eq!(design.scene_ids(), vec!["a", "b"]);
        assert_eq!(design.frame, Frame::new(40.0, 30.0));
    }

    #[test]
    fn test_apply_template_without_design_starts_one() {
        let mut session = EditorSession::new(DesignType::Presentation);
        let template = product_to_template(&product(), None).unwrap();

        let id = session.apply_template(template);

        assert_eq!(session.active_scene_id(), Some(id.as_str()));
        let design = session.export_design().unwrap().unwrap();
        assert_eq!(design.name, "Sticker");
        assert_eq!(design.kind, DesignType::Presentation);
        assert_eq!(design.scenes[0].duration, Some(5000.0));
    }

    #[test]
    fn test_export_without_live_scene_errors() {
        let mut session = EditorSession::new(DesignType::Graphic);
        session.apply_import(ImportedDesign {
            scenes: vec![],
            design: DesignHeader::new(DesignType::Graphic, "Empty", Frame::default()),
        });

        let err = session.export_design().unwrap_err();
        assert!(matches!(err, CoreError::NoActiveScene));
    }
}
