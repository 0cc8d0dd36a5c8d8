//! R-tree based spatial index using the rstar crate.
//!
//! Holds the centres of the node boxes currently on screen, in graph space,
//! and answers which node box lies under a point.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::model::PersonId;

/// A node centre in the spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePoint {
    pub id: PersonId,
    pub x: f32,
    pub y: f32,
}

impl NodePoint {
    pub fn new(id: PersonId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index for the rendered nodes.
///
/// Uses an R*-tree for efficient spatial queries.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Replace the contents with `(id, x, y)` node centres.
    ///
    /// Bulk loading is cheaper than incremental inserts after a rebuild.
    pub fn rebuild<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (PersonId, f32, f32)>,
    {
        let node_points: Vec<_> = points
            .into_iter()
            .map(|(id, x, y)| NodePoint::new(id, x, y))
            .collect();

        self.tree = RTree::bulk_load(node_points);
    }

    /// The node whose box (`2 * half_w` by `2 * half_h`, centred on the node)
    /// contains the point. Overlapping boxes resolve to the closest centre.
    pub fn hit(&self, x: f32, y: f32, half_w: f32, half_h: f32) -> Option<&PersonId> {
        let envelope = AABB::from_corners([x - half_w, y - half_h], [x + half_w, y + half_h]);
        self.tree
            .locate_in_envelope(&envelope)
            .min_by(|a, b| a.distance_2(&[x, y]).total_cmp(&b.distance_2(&[x, y])))
            .map(|point| &point.id)
    }

    /// Get the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
