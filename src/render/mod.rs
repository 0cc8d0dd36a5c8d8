//! Incremental renderer.
//!
//! Turns successive [`HourglassScene`](crate::scene::HourglassScene)s into
//! keyed, animated frames. The host draws frames; this module only decides
//! what goes where and how it moves.

pub mod interaction;
pub mod reconcile;
pub mod style;
pub mod svg;
pub mod transition;

pub use interaction::HandlerCell;
pub use reconcile::{
    ElementKey, ElementState, ElementStyle, Frame, FrameElement, Phase, Reconciler, RenderPlan,
    Visual,
};
pub use style::{LinkStyle, NodeLabels, NodeStyle};
pub use svg::render_frame;
pub use transition::{ease_cubic_in_out, Timing};
