//! Laid-out trees.

use std::collections::VecDeque;

use serde::Serialize;

use crate::model::{Person, PersonId};
use crate::tree::{NodeRole, PersonNode};

/// A person placed in graph space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub person: Person,
    pub role: NodeRole,
    pub x: f32,
    pub y: f32,
    /// Generation distance from the tree root (0 for hand-placed nodes).
    pub depth: u32,
}

impl PositionedNode {
    pub fn new(person: Person, role: NodeRole, x: f32, y: f32, depth: u32) -> Self {
        Self {
            person,
            role,
            x,
            y,
            depth,
        }
    }

    #[inline]
    pub fn id(&self) -> &PersonId {
        &self.person.id
    }
}

/// A positioned tree stored as an arena in pre-order.
///
/// Index 0 is always the root. Traversals hand out indices into
/// [`PositionedTree::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedTree {
    nodes: Vec<PositionedNode>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl PositionedTree {
    /// Flatten `tree` into pre-order storage at the origin. Positions are
    /// filled in by the layout.
    pub(crate) fn from_person_node(tree: &PersonNode) -> Self {
        let capacity = tree.size();
        let mut arena = Self {
            nodes: Vec::with_capacity(capacity),
            parents: Vec::with_capacity(capacity),
            children: Vec::with_capacity(capacity),
        };
        arena.push(tree, None, 0);
        arena
    }

    fn push(&mut self, node: &PersonNode, parent: Option<usize>, depth: u32) -> usize {
        let index = self.nodes.len();
        self.nodes.push(PositionedNode::new(
            node.person.clone(),
            node.role,
            0.0,
            0.0,
            depth,
        ));
        self.parents.push(parent);
        self.children.push(Vec::with_capacity(node.children.len()));

        for child in &node.children {
            let child_index = self.push(child, Some(index), depth + 1);
            self.children[index].push(child_index);
        }
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &PositionedNode {
        &self.nodes[0]
    }

    /// All nodes in storage (pre-order).
    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [PositionedNode] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> &PositionedNode {
        &self.nodes[index]
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    /// Node indices in breadth-first order, root first.
    pub fn bfs(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([0usize]);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            queue.extend(self.children[index].iter().copied());
        }
        order
    }

    /// Nodes in breadth-first order, root first.
    pub fn descendants(&self) -> impl Iterator<Item = &PositionedNode> + '_ {
        self.bfs().into_iter().map(move |index| &self.nodes[index])
    }

    /// Parent/child pairs in breadth-first order of the child.
    pub fn links(&self) -> impl Iterator<Item = (&PositionedNode, &PositionedNode)> + '_ {
        self.bfs().into_iter().filter_map(move |index| {
            let parent = self.parents[index]?;
            Some((&self.nodes[parent], &self.nodes[index]))
        })
    }
}
