//! Hourglass placement: descendants below the root, ancestors above.

use serde::Serialize;

use super::positioned::{PositionedNode, PositionedTree};
use super::tidy_tree::{TidyTreeConfig, TidyTreeLayout};
use crate::config::HourglassConfig;
use crate::tree::PersonNode;

/// Lay out both trees with the same tidy tree settings and flip the
/// ancestor tree upwards. Both roots end up at the origin.
pub fn layout_hourglass(
    descendant_tree: &PersonNode,
    ancestor_tree: &PersonNode,
    config: &HourglassConfig,
) -> (PositionedTree, PositionedTree) {
    let layout = TidyTreeLayout::new(TidyTreeConfig {
        node_width: config.layout_width,
        node_height: config.layout_height,
        ..Default::default()
    });

    let descendants = layout.compute(descendant_tree);
    let mut ancestors = layout.compute(ancestor_tree);
    for node in ancestors.nodes_mut() {
        node.y = -node.y;
    }

    (descendants, ancestors)
}

/// Axis-aligned pan extent `[[x0, y0], [x1, y1]]` in graph space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Bounds {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min[0] && x <= self.max[0] && y >= self.min[1] && y <= self.max[1]
    }
}

/// Extent of `nodes`, widened by half a viewport horizontally and three
/// quarters of a viewport vertically so the outermost nodes can be panned
/// into the middle of the screen.
///
/// An empty node list yields the tolerance box around the origin.
pub fn calculate_bounds<'a, I>(nodes: I, viewport_width: f32, viewport_height: f32) -> Bounds
where
    I: IntoIterator<Item = &'a PositionedNode>,
{
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for node in nodes {
        min[0] = min[0].min(node.x);
        min[1] = min[1].min(node.y);
        max[0] = max[0].max(node.x);
        max[1] = max[1].max(node.y);
    }
    if min[0] > max[0] {
        min = [0.0; 2];
        max = [0.0; 2];
    }

    let tolerance_x = viewport_width / 2.0;
    let tolerance_y = viewport_height * 0.75;

    Bounds {
        min: [min[0] - tolerance_x, min[1] - tolerance_y],
        max: [max[0] + tolerance_x, max[1] + tolerance_y],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LAYOUT_HEIGHT, LAYOUT_WIDTH};
    use crate::model::Person;
    use crate::tree::NodeRole;

    fn tree(root: &str, children: &[&str], role: NodeRole) -> PersonNode {
        PersonNode {
            person: Person::new(root),
            role: NodeRole::Root,
            children: children
                .iter()
                .map(|id| PersonNode::leaf(Person::new(*id), role))
                .collect(),
        }
    }

    #[test]
    fn test_ancestors_above_descendants_below() {
        let (descendants, ancestors) = layout_hourglass(
            &tree("r", &["c"], NodeRole::Descendant),
            &tree("r", &["f", "m"], NodeRole::Ancestor),
            &HourglassConfig::default(),
        );

        assert_eq!(descendants.root().y, 0.0);
        assert_eq!(ancestors.root().y, 0.0);
        assert_eq!(descendants.node(1).y, LAYOUT_HEIGHT);
        assert!(ancestors.nodes()[1..].iter().all(|n| n.y == -LAYOUT_HEIGHT));
        assert_eq!(ancestors.node(1).x, -LAYOUT_WIDTH / 2.0);
        assert_eq!(ancestors.node(2).x, LAYOUT_WIDTH / 2.0);
    }

    #[test]
    fn test_bounds_tolerance() {
        let nodes = [
            PositionedNode::new(Person::new("a"), NodeRole::Root, 0.0, 0.0, 0),
            PositionedNode::new(Person::new("b"), NodeRole::Sibling, -450.0, 0.0, 0),
            PositionedNode::new(Person::new("c"), NodeRole::Descendant, 100.0, 200.0, 1),
        ];
        let bounds = calculate_bounds(&nodes, 800.0, 600.0);
        assert_eq!(bounds.min, [-850.0, -450.0]);
        assert_eq!(bounds.max, [500.0, 650.0]);
        assert!(bounds.contains(0.0, 0.0));
        assert!(!bounds.contains(600.0, 0.0));
    }

    #[test]
    fn test_bounds_of_nothing() {
        let bounds = calculate_bounds(std::iter::empty(), 100.0, 100.0);
        assert_eq!(bounds.min, [-50.0, -75.0]);
        assert_eq!(bounds.max, [50.0, 75.0]);
    }
}
