//! Variant Policies
//!
//! Each design variant shares one document shape but projects scene fields
//! differently. The rules live here as data so the assembler and importer can
//! stay variant-agnostic.

use std::collections::HashSet;

use crate::core::{
    CoreError, CoreResult, DurationMs, Frame, Metadata, DEFAULT_VIDEO_SCENE_DURATION_MS,
    PRESENTATION_SCENE_DURATION_MS,
};

use super::{Design, DesignType, RenderScene, Scene};

/// Placeholder name given to nameless video scenes on import
pub const VIDEO_SCENE_PLACEHOLDER_NAME: &str = "Awesome template";

/// How a variant treats scene durations when a document is assembled
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationRule {
    /// Duration is not part of the variant; always stripped
    Drop,
    /// Every scene gets the same duration regardless of its prior value
    Fixed(DurationMs),
    /// Each scene keeps its own duration; untimed scenes get the fallback
    Preserve(DurationMs),
}

/// Per-variant field projection rules
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariantPolicy {
    pub kind: DesignType,
    /// Duration handling on export
    pub duration: DurationRule,
    /// Name written for nameless scenes on export
    pub name_fallback: Option<&'static str>,
    /// Name given to nameless scenes on import
    pub import_name_fallback: Option<&'static str>,
    /// Whether the renderer-ready scene carries the scene duration
    pub import_duration: bool,
}

const GRAPHIC_POLICY: VariantPolicy = VariantPolicy {
    kind: DesignType::Graphic,
    duration: DurationRule::Drop,
    name_fallback: None,
    import_name_fallback: None,
    import_duration: false,
};

const PRESENTATION_POLICY: VariantPolicy = VariantPolicy {
    kind: DesignType::Presentation,
    duration: DurationRule::Fixed(PRESENTATION_SCENE_DURATION_MS),
    name_fallback: None,
    import_name_fallback: None,
    import_duration: false,
};

const VIDEO_POLICY: VariantPolicy = VariantPolicy {
    kind: DesignType::Video,
    duration: DurationRule::Preserve(DEFAULT_VIDEO_SCENE_DURATION_MS),
    name_fallback: Some(""),
    import_name_fallback: Some(VIDEO_SCENE_PLACEHOLDER_NAME),
    import_duration: true,
};

impl VariantPolicy {
    /// Selects the policy for a variant
    pub fn for_type(kind: DesignType) -> &'static VariantPolicy {
        match kind {
            DesignType::Graphic => &GRAPHIC_POLICY,
            DesignType::Presentation => &PRESENTATION_POLICY,
            DesignType::Video => &VIDEO_POLICY,
        }
    }

    /// Whether every scene of this variant must carry a duration
    pub fn requires_duration(&self) -> bool {
        !matches!(self.duration, DurationRule::Drop)
    }

    /// Duration a newly created scene starts with, if the variant is timed
    pub fn default_duration(&self) -> Option<DurationMs> {
        match self.duration {
            DurationRule::Fixed(duration) | DurationRule::Preserve(duration) => Some(duration),
            DurationRule::Drop => None,
        }
    }

    // =========================================================================
    // Export projection
    // =========================================================================

    /// Projects a stored scene that is not the active one
    pub fn project_scene(&self, scene: &Scene) -> Scene {
        Scene {
            id: scene.id.clone(),
            name: self.export_name(scene.name.as_deref()),
            layers: scene.layers.clone(),
            duration: self.export_duration(scene.duration, None),
        }
    }

    /// Projects the active scene: identity from the stored entry, content from
    /// the freshly extracted snapshot
    pub fn project_active(&self, stored: &Scene, fresh: &Scene) -> Scene {
        Scene {
            id: stored.id.clone(),
            name: self.export_name(fresh.name.as_deref()),
            layers: fresh.layers.clone(),
            duration: self.export_duration(stored.duration, fresh.duration),
        }
    }

    fn export_name(&self, name: Option<&str>) -> Option<String> {
        match (name, self.name_fallback) {
            (Some(name), _) => Some(name.to_string()),
            (None, Some(fallback)) => Some(fallback.to_string()),
            (None, None) => None,
        }
    }

    fn export_duration(
        &self,
        stored: Option<DurationMs>,
        fresh: Option<DurationMs>,
    ) -> Option<DurationMs> {
        match self.duration {
            DurationRule::Drop => None,
            DurationRule::Fixed(duration) => Some(duration),
            DurationRule::Preserve(fallback) => Some(fresh.or(stored).unwrap_or(fallback)),
        }
    }

    // =========================================================================
    // Import projection
    // =========================================================================

    /// Builds the renderer-ready shape of a persisted scene
    pub fn render_scene(&self, scene: Scene, frame: &Frame) -> RenderScene {
        let name = match self.import_name_fallback {
            Some(fallback) if scene.name.as_deref().map_or(true, str::is_empty) => {
                Some(fallback.to_string())
            }
            _ => scene.name,
        };

        RenderScene {
            id: scene.id,
            name,
            frame: *frame,
            layers: scene.layers,
            metadata: Metadata::new(),
            duration: if self.import_duration {
                scene.duration
            } else {
                None
            },
        }
    }

    /// Checks a persisted document before any hydration work starts
    pub fn validate_design(&self, design: &Design) -> CoreResult<()> {
        if design.kind != self.kind {
            return Err(CoreError::VariantMismatch {
                expected: design.kind,
                requested: self.kind,
            });
        }

        if !design.frame.is_valid() {
            return Err(CoreError::ValidationError(format!(
                "Design frame must be positive, got {}x{}",
                design.frame.width, design.frame.height
            )));
        }

        if design.scenes.is_empty() {
            return Err(CoreError::ValidationError(
                "Design has no scenes".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, scene) in design.scenes.iter().enumerate() {
            if scene.id.trim().is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "Scene {} has an empty id",
                    index
                )));
            }
            if !seen.insert(scene.id.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate scene id: {}",
                    scene.id
                )));
            }
            if self.import_duration {
                match scene.duration {
                    Some(d) if d.is_finite() && d >= 0.0 => {}
                    Some(d) => {
                        return Err(CoreError::ValidationError(format!(
                            "Scene {} has an invalid duration: {}",
                            scene.id, d
                        )))
                    }
                    None => {
                        return Err(CoreError::ValidationError(format!(
                            "{} scene {} is missing a duration",
                            self.kind, scene.id
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::design::{DesignHeader, Layer};

    fn stored(id: &str) -> Scene {
        Scene::new(id)
            .with_name(format!("{id} stored"))
            .with_layers(vec![Layer::new(format!("{id}-old"))])
            .with_duration(1200.0)
    }

    #[test]
    fn test_policy_selection() {
        for kind in DesignType::ALL {
            assert_eq!(VariantPolicy::for_type(kind).kind, kind);
        }
        assert!(!VariantPolicy::for_type(DesignType::Graphic).requires_duration());
        assert!(VariantPolicy::for_type(DesignType::Presentation).requires_duration());
        assert!(VariantPolicy::for_type(DesignType::Video).requires_duration());
        assert_eq!(
            VariantPolicy::for_type(DesignType::Presentation).default_duration(),
            Some(5000.0)
        );
        assert_eq!(
            VariantPolicy::for_type(DesignType::Video).default_duration(),
            Some(DEFAULT_VIDEO_SCENE_DURATION_MS)
        );
        assert_eq!(
            VariantPolicy::for_type(DesignType::Graphic).default_duration(),
            None
        );
    }

    #[test]
    fn test_graphic_projection_drops_duration() {
        let policy = VariantPolicy::for_type(DesignType::Graphic);
        let projected = policy.project_scene(&stored("s1"));

        assert_eq!(projected.duration, None);
        assert_eq!(projected.name.as_deref(), Some("s1 stored"));
        assert_eq!(projected.layers, stored("s1").layers);
    }

    #[test]
    fn test_graphic_projection_keeps_missing_name() {
        let policy = VariantPolicy::for_type(DesignType::Graphic);
        let projected = policy.project_scene(&Scene::new("s1"));
        assert_eq!(projected.name, None);
    }

    #[test]
    fn test_presentation_projection_forces_duration() {
        let policy = VariantPolicy::for_type(DesignType::Presentation);
        let fresh = Scene::new("s1").with_duration(99.0);

        assert_eq!(policy.project_scene(&stored("s1")).duration, Some(5000.0));
        assert_eq!(
            policy.project_active(&stored("s1"), &fresh).duration,
            Some(5000.0)
        );
    }

    #[test]
    fn test_video_projection_name_fallback_and_duration() {
        let policy = VariantPolicy::for_type(DesignType::Video);
        let nameless = Scene::new("s2").with_duration(700.0);

        let projected = policy.project_scene(&nameless);
        assert_eq!(projected.name.as_deref(), Some(""));
        assert_eq!(projected.duration, Some(700.0));

        let fresh = Scene::new("s1").with_duration(4000.0);
        let active = policy.project_active(&stored("s1"), &fresh);
        assert_eq!(active.duration, Some(4000.0));
        assert_eq!(active.name.as_deref(), Some(""));

        let fresh_without_timing = Scene::new("s1");
        let active = policy.project_active(&stored("s1"), &fresh_without_timing);
        assert_eq!(active.duration, Some(1200.0));

        let never_timed = policy.project_active(&Scene::new("s9"), &Scene::new("s9"));
        assert_eq!(never_timed.duration, Some(DEFAULT_VIDEO_SCENE_DURATION_MS));
        assert_eq!(
            policy.project_scene(&Scene::new("s9")).duration,
            Some(DEFAULT_VIDEO_SCENE_DURATION_MS)
        );
    }

    #[test]
    fn test_render_scene_video_placeholder_name() {
        let policy = VariantPolicy::for_type(DesignType::Video);
        let frame = Frame::new(640.0, 360.0);

        let unnamed = policy.render_scene(Scene::new("s1").with_duration(100.0), &frame);
        assert_eq!(unnamed.name.as_deref(), Some(VIDEO_SCENE_PLACEHOLDER_NAME));
        assert_eq!(unnamed.duration, Some(100.0));
        assert_eq!(unnamed.frame, frame);

        let empty = policy.render_scene(Scene::new("s2").with_name(""), &frame);
        assert_eq!(empty.name.as_deref(), Some(VIDEO_SCENE_PLACEHOLDER_NAME));

        let named = policy.render_scene(Scene::new("s3").with_name("Intro"), &frame);
        assert_eq!(named.name.as_deref(), Some("Intro"));
    }

    #[test]
    fn test_render_scene_graphic_carries_name_without_duration() {
        let policy = VariantPolicy::for_type(DesignType::Graphic);
        let frame = Frame::default();

        let scene = policy.render_scene(stored("s1"), &frame);
        assert_eq!(scene.name.as_deref(), Some("s1 stored"));
        assert_eq!(scene.duration, None);
        assert!(scene.metadata.is_empty());

        let unnamed = policy.render_scene(Scene::new("s2"), &frame);
        assert_eq!(unnamed.name, None);
    }

    fn design(kind: DesignType, scenes: Vec<Scene>) -> Design {
        DesignHeader::new(kind, "Doc", Frame::new(100.0, 100.0)).with_scenes(scenes)
    }

    #[test]
    fn test_validate_design_accepts_well_formed() {
        let policy = VariantPolicy::for_type(DesignType::Video);
        let doc = design(DesignType::Video, vec![stored("a"), stored("b")]);
        assert!(policy.validate_design(&doc).is_ok());
    }

    #[test]
    fn test_validate_design_rejects_bad_documents() {
        let video = VariantPolicy::for_type(DesignType::Video);
        let graphic = VariantPolicy::for_type(DesignType::Graphic);

        let empty = design(DesignType::Graphic, vec![]);
        assert!(matches!(
            graphic.validate_design(&empty),
            Err(CoreError::ValidationError(_))
        ));

        let duplicate = design(DesignType::Graphic, vec![stored("a"), stored("a")]);
        assert!(graphic.validate_design(&duplicate).is_err());

        let untimed = design(DesignType::Video, vec![Scene::new("a")]);
        assert!(video.validate_design(&untimed).is_err());

        let mismatch = design(DesignType::Graphic, vec![stored("a")]);
        assert!(matches!(
            video.validate_design(&mismatch),
            Err(CoreError::VariantMismatch { .. })
        ));

        let mut flat = design(DesignType::Graphic, vec![stored("a")]);
        flat.frame.height = 0.0;
        assert!(graphic.validate_design(&flat).is_err());
    }
}
