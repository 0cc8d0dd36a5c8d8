//! Layout algorithms for the hourglass graph.
//!
//! The tidy tree engine positions each of the two family trees; the hourglass
//! step stacks them around the shared root and derives the pan extent.

pub mod hourglass;
pub mod positioned;
pub mod tidy_tree;

pub use hourglass::{calculate_bounds, layout_hourglass, Bounds};
pub use positioned::{PositionedNode, PositionedTree};
pub use tidy_tree::{TidyTreeConfig, TidyTreeLayout};
