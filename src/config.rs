//! Layout and view configuration.
//!
//! Both structs deserialize from partial JS objects; anything left out keeps
//! its default.

use serde::Deserialize;

/// Horizontal distance between neighbouring nodes.
pub const LAYOUT_WIDTH: f32 = 450.0;
/// Vertical distance between generations.
pub const LAYOUT_HEIGHT: f32 = 200.0;
/// Rendered node box width.
pub const NODE_WIDTH: f32 = 300.0;
/// Rendered node box height.
pub const NODE_HEIGHT: f32 = 105.0;
/// Duration of enter/update/exit transitions in milliseconds.
pub const TRANSITION_DURATION: f64 = 500.0;

/// Geometry of the hourglass graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HourglassConfig {
    /// Horizontal footprint per node used by the tree layout.
    pub layout_width: f32,
    /// Vertical footprint per generation used by the tree layout.
    pub layout_height: f32,
    /// Width of a rendered node box (hit testing, SVG output).
    pub node_width: f32,
    /// Height of a rendered node box.
    pub node_height: f32,
    /// Vertical offset between parallel spouse lines.
    pub spouse_line_offset: f32,
}

impl Default for HourglassConfig {
    fn default() -> Self {
        Self {
            layout_width: LAYOUT_WIDTH,
            layout_height: LAYOUT_HEIGHT,
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            spouse_line_offset: 12.0,
        }
    }
}

/// Configuration of the interactive view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    pub hourglass: HourglassConfig,
    /// Transition duration in milliseconds.
    pub transition_ms: f64,
    /// Smallest allowed zoom factor.
    pub min_scale: f32,
    /// Largest allowed zoom factor.
    pub max_scale: f32,
    /// Query radius passed to the fetch collaborator (None = unbounded).
    pub fetch_distance: Option<u32>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            hourglass: HourglassConfig::default(),
            transition_ms: TRANSITION_DURATION,
            min_scale: 0.1,
            max_scale: 4.0,
            fetch_distance: None,
        }
    }
}
