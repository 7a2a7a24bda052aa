//! Document Assembler
//!
//! Merges the freshly extracted active scene back into the caller's ordered
//! scene list and produces a complete design of the requested variant.
//!
//! Scene identity and position always come from the caller's list; only the
//! matched scene's content changes, so repeated exports keep a stable order.

use tracing::{debug, warn};

use crate::core::{
    design::{Design, DesignHeader, DesignType, Scene, VariantPolicy},
    CoreError, CoreResult, Metadata,
};

/// Merges `active` into `scenes`, projecting every entry for `kind`.
///
/// Pure function: the input list is never mutated.
pub fn merge_scenes(kind: DesignType, active: &Scene, scenes: &[Scene]) -> Vec<Scene> {
    let policy = VariantPolicy::for_type(kind);

    if scenes.is_empty() {
        debug!(scene_id = %active.id, "No stored scenes, active scene becomes the only scene");
        let fresh = Scene {
            id: active.id.clone(),
            name: None,
            layers: Vec::new(),
            duration: None,
        };
        return vec![policy.project_active(&fresh, active)];
    }

    if !scenes.iter().any(|s| s.id == active.id) {
        warn!(
            scene_id = %active.id,
            "Active scene is not part of the stored scene list; its edits are not exported"
        );
    }

    scenes
        .iter()
        .map(|stored| {
            if stored.id == active.id {
                policy.project_active(stored, active)
            } else {
                policy.project_scene(stored)
            }
        })
        .collect()
}

/// Assembles a complete design document.
///
/// Returns `Ok(None)` when there is no current design yet, which tells the
/// caller there is nothing to export.
pub fn assemble_design(
    kind: DesignType,
    active: &Scene,
    scenes: &[Scene],
    current: Option<&DesignHeader>,
) -> CoreResult<Option<Design>> {
    let Some(current) = current else {
        debug!("No current design, nothing to assemble");
        return Ok(None);
    };

    if current.kind != kind {
        return Err(CoreError::VariantMismatch {
            expected: current.kind,
            requested: kind,
        });
    }

    let scenes = merge_scenes(kind, active, scenes);
    debug!(
        design_id = %current.id,
        kind = %kind,
        scene_count = scenes.len(),
        "Assembled design"
    );

    Ok(Some(Design {
        id: current.id.clone(),
        kind,
        name: current.name.clone(),
        frame: current.frame,
        scenes,
        metadata: Metadata::new(),
        preview: String::new(),
    }))
}
