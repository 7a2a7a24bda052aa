//! LayerDeck Core Type Definitions
//!
//! Defines fundamental types shared by the design pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Design unique identifier (ULID for locally created designs)
pub type DesignId = String;

/// Scene unique identifier (ULID for locally created scenes)
pub type SceneId = String;

/// Layer identifier (unique within a scene)
pub type LayerId = String;

/// Free-form JSON mapping used for design and scene metadata
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Generates a fresh identifier for locally created documents and scenes
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Identifier issued by a remote service.
///
/// Remote endpoints are inconsistent about whether ids are numbers or strings,
/// so both are accepted and rendered the same way.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Number(n) => write!(f, "{}", n),
            ExternalId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        ExternalId::Text(value.to_string())
    }
}

impl From<i64> for ExternalId {
    fn from(value: i64) -> Self {
        ExternalId::Number(value)
    }
}

// =============================================================================
// Time Types
// =============================================================================

/// Scene duration in milliseconds
pub type DurationMs = f64;

/// Fixed per-scene duration applied to every presentation scene
pub const PRESENTATION_SCENE_DURATION_MS: DurationMs = 5000.0;

/// Duration given to video scenes that have never been timed
pub const DEFAULT_VIDEO_SCENE_DURATION_MS: DurationMs = 5000.0;

// =============================================================================
// Spatial Types
// =============================================================================

/// Canvas size shared by every scene of a design
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
}

impl Frame {
    /// Creates a new frame, falling back to 1x1 for unusable dimensions
    pub fn new(width: f64, height: f64) -> Self {
        if !is_usable_dimension(width) || !is_usable_dimension(height) {
            warn!(
                "Frame created with unusable dimensions {}x{}, defaulting to 1x1",
                width, height
            );
            return Self {
                width: 1.0,
                height: 1.0,
            };
        }
        Self { width, height }
    }

    /// Returns true when both dimensions are finite and positive
    pub fn is_valid(&self) -> bool {
        is_usable_dimension(self.width) && is_usable_dimension(self.height)
    }

    /// Returns the aspect ratio (width / height)
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0.0 {
            return 0.0;
        }
        self.width / self.height
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

fn is_usable_dimension(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new_rejects_invalid_dimensions() {
        assert_eq!(Frame::new(0.0, 50.0), Frame::new(1.0, 1.0));
        assert_eq!(Frame::new(f64::NAN, 50.0).width, 1.0);
        assert_eq!(Frame::new(100.0, 50.0).aspect_ratio(), 2.0);
    }

    #[test]
    fn test_frame_validity() {
        assert!(Frame::default().is_valid());
        let frame = Frame {
            width: -1.0,
            height: 10.0,
        };
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_external_id_accepts_numbers_and_strings() {
        let n: ExternalId = serde_json::from_str("42").unwrap();
        let s: ExternalId = serde_json::from_str("\"abc\"").unwrap();

        assert_eq!(n, ExternalId::Number(42));
        assert_eq!(s.to_string(), "abc");
        assert_eq!(n.to_string(), "42");
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
        assert_eq!(new_id().len(), 26);
    }
}
