//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index that maps a point in
//! graph space to the node drawn there.

mod rtree;

pub use rtree::{NodePoint, SpatialIndex};
