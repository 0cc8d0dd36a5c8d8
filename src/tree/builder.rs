//! Expansion of the reference-only DTO into the two hourglass trees.
//!
//! The family graph contains cycles (two parents share a child, spouses point
//! at each other), so it is never laid out as a graph. Instead two disjoint
//! trees are materialized from the root: descendants (children plus their
//! spouses as pseudo leaves) and ancestors (parents only). Siblings and the
//! root's spouses are placed by hand next to the root.
//!
//! References that are missing from the graph were cut off by the query
//! radius and are skipped without error. Ordering is taken from the source
//! lists as-is; the builder never re-sorts.

use std::collections::HashSet;

use log::warn;

use super::node::{NodeRole, PersonNode};
use crate::layout::PositionedNode;
use crate::model::{FamilyTreeGraph, PersonId};

/// Build the descendant tree rooted at `id`.
///
/// Each present child is followed by its present spouses as leaf nodes with
/// role [`NodeRole::DescendantSpouse`], so the layout places spouses directly
/// next to their partner. Returns `None` if `id` itself is not in the graph.
pub fn build_descendant_tree(graph: &FamilyTreeGraph, id: &PersonId) -> Option<PersonNode> {
    let mut path = HashSet::new();
    descend(graph, id, &mut path)
}

fn descend(
    graph: &FamilyTreeGraph,
    id: &PersonId,
    path: &mut HashSet<PersonId>,
) -> Option<PersonNode> {
    let person = graph.person(id)?;

    // An id already on the current path means the data loops back on itself
    if !path.insert(id.clone()) {
        warn!("descendant cycle through '{id}', dropping the repeated reference");
        return None;
    }

    let mut children = Vec::with_capacity(person.children.len());
    for child_id in &person.children {
        let Some(child) = graph.person(child_id) else {
            continue;
        };
        let Some(child_node) = descend(graph, child_id, path) else {
            continue;
        };
        children.push(child_node);

        // Spouses stay leaves; expanding them would duplicate the subtree
        children.extend(
            child
                .spouses
                .iter()
                .filter_map(|spouse| graph.person(&spouse.id))
                .map(|spouse| PersonNode::leaf(spouse.clone(), NodeRole::DescendantSpouse)),
        );
    }

    path.remove(id);

    Some(PersonNode {
        person: person.clone(),
        role: NodeRole::Descendant,
        children,
    })
}

/// Build the ancestor tree rooted at `id`, walking parent references.
///
/// No spouse nodes are injected: the only relevant spouse of a parent is the
/// other parent, which is already a sibling in this tree.
pub fn build_ancestor_tree(graph: &FamilyTreeGraph, id: &PersonId) -> Option<PersonNode> {
    let mut path = HashSet::new();
    ascend(graph, id, &mut path)
}

fn ascend(
    graph: &FamilyTreeGraph,
    id: &PersonId,
    path: &mut HashSet<PersonId>,
) -> Option<PersonNode> {
    let person = graph.person(id)?;

    if !path.insert(id.clone()) {
        warn!("ancestor cycle through '{id}', dropping the repeated reference");
        return None;
    }

    let children = person
        .parents
        .iter()
        .filter_map(|parent_id| ascend(graph, parent_id, path))
        .collect();

    path.remove(id);

    Some(PersonNode {
        person: person.clone(),
        role: NodeRole::Ancestor,
        children,
    })
}

/// Build both trees around the graph's root and mark their roots as such.
pub fn build_hourglass_tree(graph: &FamilyTreeGraph) -> Option<(PersonNode, PersonNode)> {
    let id = graph.root_id();

    let mut descendant_tree = build_descendant_tree(graph, id)?;
    let mut ancestor_tree = build_ancestor_tree(graph, id)?;

    descendant_tree.role = NodeRole::Root;
    ancestor_tree.role = NodeRole::Root;

    Some((descendant_tree, ancestor_tree))
}

/// Place the root's siblings to its left, in source order.
///
/// The slot index counts every sibling entry, so a sibling cut off by the
/// query radius leaves its slot empty instead of shifting the others.
pub fn create_sibling_nodes(graph: &FamilyTreeGraph, layout_width: f32) -> Vec<PositionedNode> {
    graph
        .root()
        .siblings
        .iter()
        .enumerate()
        .filter_map(|(i, sibling)| {
            let person = graph.person(&sibling.id)?;
            Some(PositionedNode::new(
                person.clone(),
                NodeRole::Sibling,
                -((i + 1) as f32) * layout_width,
                0.0,
                0,
            ))
        })
        .collect()
}

/// Place the root's spouses to its right, in source order.
pub fn create_spouse_nodes(graph: &FamilyTreeGraph, layout_width: f32) -> Vec<PositionedNode> {
    graph
        .root()
        .spouses
        .iter()
        .enumerate()
        .filter_map(|(i, spouse)| {
            let person = graph.person(&spouse.id)?;
            Some(PositionedNode::new(
                person.clone(),
                NodeRole::RootSpouse,
                (i + 1) as f32 * layout_width,
                0.0,
                0,
            ))
        })
        .collect()
}
