//! Buchheim-Junger-Leipert tidy tree layout algorithm.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run in
//! Linear Time" (Buchheim, Junger, Leipert, 2002) for laying out family trees
//! with compact, node-size based positioning.
//!
//! # Algorithm Overview
//!
//! 1. **First walk (bottom-up):** Recursively assign preliminary x-coordinates
//!    to each node by merging subtree contours. Uses threads for O(1) amortized
//!    contour traversal.
//! 2. **Second walk (top-down):** Apply accumulated modifiers to convert
//!    preliminary x-coordinates to final positions. The root is pinned at 0.
//! 3. **Scaling:** x is measured in separation units and multiplied by
//!    `node_width`; y is `depth * node_height`.

use super::positioned::PositionedTree;
use crate::config::{LAYOUT_HEIGHT, LAYOUT_WIDTH};
use crate::tree::PersonNode;

/// Configuration for the tidy tree layout.
#[derive(Debug, Clone)]
pub struct TidyTreeConfig {
    /// Separation between nodes sharing a parent, in units of `node_width`.
    pub sibling_separation: f32,
    /// Separation between nodes of different parents, in units of `node_width`.
    pub subtree_separation: f32,
    /// Horizontal size reserved per separation unit.
    pub node_width: f32,
    /// Vertical spacing between generations.
    pub node_height: f32,
}

impl Default for TidyTreeConfig {
    fn default() -> Self {
        Self {
            sibling_separation: 1.0,
            subtree_separation: 2.0,
            node_width: LAYOUT_WIDTH,
            node_height: LAYOUT_HEIGHT,
        }
    }
}

/// Internal node data used during the Buchheim algorithm.
#[derive(Debug)]
struct LayoutNode {
    /// Parent layout index (None for root).
    parent: Option<usize>,
    /// Children in tree order.
    children: Vec<usize>,
    /// Preliminary x-coordinate (from first walk).
    prelim: f32,
    /// Modifier for subtree shift (accumulated in first walk, applied in second).
    modifier: f32,
    /// Contour thread for leaves, pointing into the next level.
    thread: Option<usize>,
    /// Ancestor pointer used to find the greatest distinct ancestor.
    ancestor: usize,
    /// Default ancestor of this node's children while apportioning.
    default_ancestor: Option<usize>,
    /// Shift value for even spacing of intermediate children.
    shift: f32,
    /// Change value for even spacing of intermediate children.
    change: f32,
    /// Left-to-right index among siblings.
    number: usize,
}

/// The tidy tree layout engine.
pub struct TidyTreeLayout {
    config: TidyTreeConfig,
}

impl TidyTreeLayout {
    /// Create a new tidy tree layout with the given configuration.
    pub fn new(config: TidyTreeConfig) -> Self {
        Self { config }
    }

    /// Create a tidy tree layout with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TidyTreeConfig::default())
    }

    pub fn config(&self) -> &TidyTreeConfig {
        &self.config
    }

    /// Compute positions for every node of `tree`.
    ///
    /// The result is a pure function of the tree's shape: equal shapes give
    /// equal coordinates.
    pub fn compute(&self, tree: &PersonNode) -> PositionedTree {
        let mut positioned = PositionedTree::from_person_node(tree);
        let mut nodes = Self::build_layout_nodes(&positioned);

        self.first_walk(0, &mut nodes);

        let mut final_x = vec![0.0f32; nodes.len()];
        // Offset by the root's prelim so the root lands on x = 0
        let root_offset = -nodes[0].prelim;
        self.second_walk_collect(0, root_offset, &nodes, &mut final_x);

        for (node, x) in positioned.nodes_mut().iter_mut().zip(final_x) {
            node.x = x * self.config.node_width;
            node.y = node.depth as f32 * self.config.node_height;
        }
        positioned
    }

    /// Mirror the arena's structure into fresh layout nodes.
    fn build_layout_nodes(tree: &PositionedTree) -> Vec<LayoutNode> {
        (0..tree.len())
            .map(|index| {
                let number = tree
                    .parent(index)
                    .and_then(|parent| tree.children(parent).iter().position(|&c| c == index))
                    .unwrap_or(0);
                LayoutNode {
                    parent: tree.parent(index),
                    children: tree.children(index).to_vec(),
                    prelim: 0.0,
                    modifier: 0.0,
                    thread: None,
                    ancestor: index,
                    default_ancestor: None,
                    shift: 0.0,
                    change: 0.0,
                    number,
                }
            })
            .collect()
    }

    /// Buchheim first walk: bottom-up assignment of preliminary x-coordinates.
    fn first_walk(&self, v: usize, nodes: &mut [LayoutNode]) {
        for i in 0..nodes[v].children.len() {
            let child = nodes[v].children[i];
            self.first_walk(child, nodes);
        }

        let left_sibling = self.left_sibling(v, nodes);

        let first = nodes[v].children.first().copied();
        let last = nodes[v].children.last().copied();

        if let (Some(first), Some(last)) = (first, last) {
            self.execute_shifts(v, nodes);
            let midpoint = (nodes[first].prelim + nodes[last].prelim) / 2.0;
            if let Some(w) = left_sibling {
                nodes[v].prelim = nodes[w].prelim + self.separation(v, w, nodes);
                nodes[v].modifier = nodes[v].prelim - midpoint;
            } else {
                nodes[v].prelim = midpoint;
            }
        } else if let Some(w) = left_sibling {
            nodes[v].prelim = nodes[w].prelim + self.separation(v, w, nodes);
        }

        if let Some(parent) = nodes[v].parent {
            let default_ancestor = nodes[parent]
                .default_ancestor
                .unwrap_or(nodes[parent].children[0]);
            let next = self.apportion(v, left_sibling, default_ancestor, nodes);
            nodes[parent].default_ancestor = Some(next);
        }
    }

    fn left_sibling(&self, v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        let parent = nodes[v].parent?;
        let number = nodes[v].number;
        if number == 0 {
            None
        } else {
            Some(nodes[parent].children[number - 1])
        }
    }

    /// Desired distance between two neighbouring contour nodes.
    fn separation(&self, a: usize, b: usize, nodes: &[LayoutNode]) -> f32 {
        if nodes[a].parent == nodes[b].parent {
            self.config.sibling_separation
        } else {
            self.config.subtree_separation
        }
    }

    /// Get the next node on the right contour of a subtree.
    fn next_right(&self, v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        nodes[v].children.last().copied().or(nodes[v].thread)
    }

    /// Get the next node on the left contour of a subtree.
    fn next_left(&self, v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        nodes[v].children.first().copied().or(nodes[v].thread)
    }

    /// Apportion: push `v`'s subtree right until it clears every subtree to
    /// its left, threading contours as they end.
    fn apportion(
        &self,
        v: usize,
        left_sibling: Option<usize>,
        mut default_ancestor: usize,
        nodes: &mut [LayoutNode],
    ) -> usize {
        let Some(w) = left_sibling else {
            return default_ancestor;
        };
        let Some(parent) = nodes[v].parent else {
            return default_ancestor;
        };

        // inner/outer contours of v (right) and its left siblings (left)
        let mut v_inner_right = v;
        let mut v_outer_right = v;
        let mut v_inner_left = w;
        let mut v_outer_left = nodes[parent].children[0];

        let mut s_inner_right = nodes[v_inner_right].modifier;
        let mut s_outer_right = nodes[v_outer_right].modifier;
        let mut s_inner_left = nodes[v_inner_left].modifier;
        let mut s_outer_left = nodes[v_outer_left].modifier;

        let mut next_il = self.next_right(v_inner_left, nodes);
        let mut next_ir = self.next_left(v_inner_right, nodes);

        while let (Some(il), Some(ir)) = (next_il, next_ir) {
            v_inner_left = il;
            v_inner_right = ir;

            if let Some(next) = self.next_left(v_outer_left, nodes) {
                v_outer_left = next;
            }
            if let Some(next) = self.next_right(v_outer_right, nodes) {
                v_outer_right = next;
            }

            nodes[v_outer_right].ancestor = v;

            let shift = nodes[v_inner_left].prelim + s_inner_left
                - nodes[v_inner_right].prelim
                - s_inner_right
                + self.separation(v_inner_left, v_inner_right, nodes);

            if shift > 0.0 {
                let wl = self.next_ancestor(v_inner_left, v, default_ancestor, nodes);
                self.move_subtree(wl, v, shift, nodes);
                s_inner_right += shift;
                s_outer_right += shift;
            }

            s_inner_left += nodes[v_inner_left].modifier;
            s_inner_right += nodes[v_inner_right].modifier;
            s_outer_left += nodes[v_outer_left].modifier;
            s_outer_right += nodes[v_outer_right].modifier;

            next_il = self.next_right(v_inner_left, nodes);
            next_ir = self.next_left(v_inner_right, nodes);
        }

        // Left contour is deeper: thread the right subtree's outer contour into it
        if let Some(il) = next_il {
            if self.next_right(v_outer_right, nodes).is_none() {
                nodes[v_outer_right].thread = Some(il);
                nodes[v_outer_right].modifier += s_inner_left - s_outer_right;
            }
        }

        // Right contour is deeper: thread the left siblings' outer contour into it
        if let Some(ir) = next_ir {
            if self.next_left(v_outer_left, nodes).is_none() {
                nodes[v_outer_left].thread = Some(ir);
                nodes[v_outer_left].modifier += s_inner_right - s_outer_left;
                default_ancestor = v;
            }
        }

        default_ancestor
    }

    /// The left of the two greatest distinct ancestors of `v_inner_left` and `v`.
    fn next_ancestor(
        &self,
        v_inner_left: usize,
        v: usize,
        default_ancestor: usize,
        nodes: &[LayoutNode],
    ) -> usize {
        let candidate = nodes[v_inner_left].ancestor;
        if nodes[candidate].parent == nodes[v].parent {
            candidate
        } else {
            default_ancestor
        }
    }

    /// Move subtree `wr` right by `shift`, spreading the change over the
    /// subtrees between `wl` and `wr`.
    fn move_subtree(&self, wl: usize, wr: usize, shift: f32, nodes: &mut [LayoutNode]) {
        let subtrees = (nodes[wr].number as f32 - nodes[wl].number as f32).max(1.0);
        let change = shift / subtrees;

        nodes[wr].change -= change;
        nodes[wr].shift += shift;
        nodes[wl].change += change;
        nodes[wr].prelim += shift;
        nodes[wr].modifier += shift;
    }

    /// Execute accumulated shifts for children of node v.
    fn execute_shifts(&self, v: usize, nodes: &mut [LayoutNode]) {
        let mut shift = 0.0f32;
        let mut change = 0.0f32;

        for i in (0..nodes[v].children.len()).rev() {
            let child = nodes[v].children[i];
            nodes[child].prelim += shift;
            nodes[child].modifier += shift;
            change += nodes[child].change;
            shift += nodes[child].shift + change;
        }
    }

    /// Second walk: apply accumulated modifiers to get final x-coordinates.
    fn second_walk_collect(
        &self,
        v: usize,
        modifier_sum: f32,
        nodes: &[LayoutNode],
        final_x: &mut [f32],
    ) {
        final_x[v] = nodes[v].prelim + modifier_sum;

        for &child in &nodes[v].children {
            self.second_walk_collect(child, modifier_sum + nodes[v].modifier, nodes, final_x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Person;
    use crate::tree::NodeRole;

    fn node(id: &str, children: Vec<PersonNode>) -> PersonNode {
        PersonNode {
            person: Person::new(id),
            role: NodeRole::Descendant,
            children,
        }
    }

    fn leaf(id: &str) -> PersonNode {
        node(id, Vec::new())
    }

    fn unit_layout() -> TidyTreeLayout {
        TidyTreeLayout::new(TidyTreeConfig {
            node_width: 1.0,
            node_height: 1.0,
            ..Default::default()
        })
    }

    fn x_of(tree: &PositionedTree, id: &str) -> f32 {
        tree.nodes()
            .iter()
            .find(|n| n.id().as_str() == id)
            .map(|n| n.x)
            .unwrap()
    }

    #[test]
    fn test_single_node() {
        let result = TidyTreeLayout::with_defaults().compute(&leaf("r"));
        assert_eq!(result.len(), 1);
        assert_eq!(result.root().x, 0.0);
        assert_eq!(result.root().y, 0.0);
    }

    #[test]
    fn test_simple_tree() {
        let layout = TidyTreeLayout::with_defaults();
        let result = layout.compute(&node("r", vec![leaf("a"), leaf("b")]));

        assert_eq!(result.len(), 3);
        assert_eq!(result.root().x, 0.0);

        // Siblings one node width apart, centred under the root
        assert!((x_of(&result, "a") + LAYOUT_WIDTH / 2.0).abs() < 0.01);
        assert!((x_of(&result, "b") - LAYOUT_WIDTH / 2.0).abs() < 0.01);

        for child in &result.nodes()[1..] {
            assert!(
                (child.y - LAYOUT_HEIGHT).abs() < 0.01,
                "child y should be {LAYOUT_HEIGHT}, got {}",
                child.y
            );
        }
    }

    #[test]
    fn test_cousins_use_subtree_separation() {
        // r -> (a -> (c), b -> (d)): c and d are cousins, 2 units apart
        let result = unit_layout().compute(&node(
            "r",
            vec![node("a", vec![leaf("c")]), node("b", vec![leaf("d")])],
        ));

        assert!((x_of(&result, "d") - x_of(&result, "c") - 2.0).abs() < 0.01);
        assert!((x_of(&result, "b") - x_of(&result, "a") - 2.0).abs() < 0.01);
        assert_eq!(x_of(&result, "r"), 0.0);
    }

    #[test]
    fn test_deeper_tree() {
        let layout = TidyTreeLayout::new(TidyTreeConfig {
            node_height: 50.0,
            ..Default::default()
        });

        let result = layout.compute(&node(
            "r",
            vec![
                node("a", vec![leaf("c"), leaf("d")]),
                node("b", vec![leaf("e")]),
            ],
        ));

        assert_eq!(result.len(), 6);
        for n in result.nodes() {
            assert!(
                (n.y - n.depth as f32 * 50.0).abs() < 0.01,
                "{} at depth {}",
                n.id(),
                n.depth
            );
        }
    }

    #[test]
    fn test_asymmetric_tree() {
        // Left subtree deeper than right
        let result = unit_layout().compute(&node(
            "r",
            vec![node("a", vec![node("c", vec![leaf("e")])]), leaf("b")],
        ));

        assert_eq!(result.len(), 5);
        let deepest = result.nodes().iter().find(|n| n.id().as_str() == "e").unwrap();
        assert!((deepest.y - 3.0).abs() < 0.01);

        let left_max_x = x_of(&result, "a").max(x_of(&result, "c")).max(x_of(&result, "e"));
        assert!(
            left_max_x < x_of(&result, "b"),
            "Subtrees should not overlap: left max x = {left_max_x}"
        );
    }

    #[test]
    fn test_small_subtree_between_wide_ones_is_centred() {
        // Middle child is a leaf squeezed between two wide subtrees
        let wide = |id: &str| {
            node(
                id,
                vec![leaf(&format!("{id}1")), leaf(&format!("{id}2")), leaf(&format!("{id}3"))],
            )
        };
        let result = unit_layout().compute(&node("r", vec![wide("a"), leaf("m"), wide("b")]));

        let a = x_of(&result, "a");
        let m = x_of(&result, "m");
        let b = x_of(&result, "b");
        assert!((m - a - (b - m)).abs() < 0.01, "a={a} m={m} b={b}");

        // No two nodes on the same level closer than one unit
        let nodes = result.nodes();
        for (i, p) in nodes.iter().enumerate() {
            for q in &nodes[i + 1..] {
                if p.depth == q.depth {
                    assert!((p.x - q.x).abs() >= 1.0 - 1e-3, "{} and {} overlap", p.id(), q.id());
                }
            }
        }
    }

    #[test]
    fn test_same_shape_same_coordinates() {
        let layout = TidyTreeLayout::with_defaults();
        let one = layout.compute(&node("r", vec![node("a", vec![leaf("c")]), leaf("b")]));
        let two = layout.compute(&node("x", vec![node("y", vec![leaf("z")]), leaf("w")]));
        let xs = |t: &PositionedTree| t.nodes().iter().map(|n| (n.x, n.y)).collect::<Vec<_>>();
        assert_eq!(xs(&one), xs(&two));
    }
}
