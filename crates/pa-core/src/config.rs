//! Painter configuration.

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Default size for a placed signature or stamp image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampSize {
    pub width: f64,
    pub height: f64,
}

/// Configuration for a `Painter`.
///
/// Every field has a default, so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainterConfig {
    /// Author name stamped into new records and comments.
    pub user_name: String,

    /// History snapshots kept by the store. Default: **50**.
    pub max_history: usize,

    /// Eraser hit radius in canvas units. Default: **10**.
    pub eraser_radius: f64,

    pub default_color: Color,
    pub note_color: Color,
    pub stroke_width: f64,
    pub opacity: f64,
    pub font_size: f64,

    /// Free text wraps beyond this width. Default: **300**.
    pub free_text_max_width: f64,

    /// Linear step for rectangle outlines written to the host.
    pub rect_outline_step: f64,

    /// Angular step for ellipse outlines written to the host.
    pub ellipse_step_degrees: f64,

    /// Drags smaller than this on either axis are discarded.
    pub min_shape_size: f64,

    pub stamp_size: StampSize,

    /// Page renders to wait for before a deferred selection gives up.
    pub selection_retry_limit: u32,

    /// Resize handle hit radius, in canvas units.
    pub handle_size: f64,
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            user_name: "unknown".to_string(),
            max_history: 50,
            eraser_radius: 10.0,
            default_color: Color::RED,
            note_color: Color::NOTE_YELLOW,
            stroke_width: 2.0,
            opacity: 1.0,
            font_size: 16.0,
            free_text_max_width: 300.0,
            rect_outline_step: 0.5,
            ellipse_step_degrees: 0.5,
            min_shape_size: 2.0,
            stamp_size: StampSize {
                width: 120.0,
                height: 60.0,
            },
            selection_retry_limit: 10,
            handle_size: 8.0,
        }
    }
}

impl PainterConfig {
    /// Parse a (possibly partial) JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
