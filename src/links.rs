//! Link synthesis for relations the tidy trees do not express.
//!
//! Every list is returned in draw order: later links overlay earlier ones.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::layout::{PositionedNode, PositionedTree};
use crate::model::{PartialDate, PersonId, SpouseRef};
use crate::tree::NodeRole;

/// Marriage details carried by a spouse link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpouseLinkData {
    pub since: PartialDate,
    pub until: PartialDate,
    /// Number of other spouse nodes between the two partners. Used to offset
    /// parallel marriage lines.
    pub nodes_in_between: Option<usize>,
}

impl SpouseLinkData {
    fn from_ref(spouse: &SpouseRef, nodes_in_between: Option<usize>) -> Self {
        Self {
            since: spouse.since(),
            until: spouse.until(),
            nodes_in_between,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LinkData {
    Spouse(SpouseLinkData),
}

/// A drawn connection between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub source: PositionedNode,
    pub target: PositionedNode,
    pub data: Option<LinkData>,
}

impl Link {
    pub fn new(source: PositionedNode, target: PositionedNode) -> Self {
        Self {
            source,
            target,
            data: None,
        }
    }

    pub fn spouse(source: PositionedNode, target: PositionedNode, data: SpouseLinkData) -> Self {
        Self {
            source,
            target,
            data: Some(LinkData::Spouse(data)),
        }
    }

    pub fn spouse_data(&self) -> Option<&SpouseLinkData> {
        match &self.data {
            Some(LinkData::Spouse(data)) => Some(data),
            None => None,
        }
    }

    #[inline]
    pub fn is_spouse(&self) -> bool {
        self.spouse_data().is_some()
    }

    /// Direction independent identity of this link.
    pub fn key(&self) -> String {
        link_key(self.source.id(), self.target.id())
    }
}

/// Sorted endpoint ids joined with `--`.
pub fn link_key(a: &PersonId, b: &PersonId) -> String {
    if a <= b {
        format!("{a}--{b}")
    } else {
        format!("{b}--{a}")
    }
}

/// Root to sibling links, in sibling order.
pub fn create_sibling_links(root: &PositionedNode, siblings: &[PositionedNode]) -> Vec<Link> {
    siblings
        .iter()
        .map(|sibling| Link::new(root.clone(), sibling.clone()))
        .collect()
}

/// Root to spouse links, farthest spouse first.
///
/// A spouse node without a matching reference on the root is skipped.
pub fn create_spouse_links(root: &PositionedNode, spouses: &[PositionedNode]) -> Vec<Link> {
    let mut links: Vec<Link> = spouses
        .iter()
        .enumerate()
        .filter_map(|(i, spouse)| {
            let spouse_ref = root.person.spouse_ref(spouse.id())?;
            Some(Link::spouse(
                root.clone(),
                spouse.clone(),
                SpouseLinkData::from_ref(spouse_ref, Some(i)),
            ))
        })
        .collect();
    links.reverse();
    links
}

/// Links from injected spouse pseudo nodes to the descendant they married.
///
/// Spouses are looked up among the same parent's `descendant-spouse` children;
/// ones that were not materialized are skipped.
pub fn create_descendant_spouse_links(tree: &PositionedTree) -> Vec<Link> {
    let mut links = Vec::new();

    for parent in tree.bfs() {
        let children = tree.children(parent);
        let spouse_nodes: HashMap<&PersonId, &PositionedNode> = children
            .iter()
            .map(|&c| tree.node(c))
            .filter(|node| node.role == NodeRole::DescendantSpouse)
            .map(|node| (node.id(), node))
            .collect();

        for child in children.iter().map(|&c| tree.node(c)) {
            if child.role != NodeRole::Descendant {
                continue;
            }
            for (i, spouse_ref) in child.person.spouses.iter().enumerate() {
                let Some(&spouse_node) = spouse_nodes.get(&spouse_ref.id) else {
                    continue;
                };
                links.push(Link::spouse(
                    spouse_node.clone(),
                    child.clone(),
                    SpouseLinkData::from_ref(spouse_ref, Some(i)),
                ));
            }
        }
    }

    links.reverse();
    links
}

/// Links between married parent pairs of the ancestor tree.
///
/// Each parent is linked to its first listed spouse that is also a parent of
/// the same child. A parent that already received a link cannot be picked as
/// a partner again, so every pair is linked once.
pub fn create_ancestor_spouse_links(tree: &PositionedTree) -> Vec<Link> {
    let mut links = Vec::new();

    for child in tree.bfs() {
        let parents = tree.children(child);
        let parent_nodes: HashMap<&PersonId, &PositionedNode> = parents
            .iter()
            .map(|&p| tree.node(p))
            .map(|node| (node.id(), node))
            .collect();
        let mut paired: HashSet<&PersonId> = HashSet::new();

        for parent in parents.iter().map(|&p| tree.node(p)) {
            let partner = parent.person.spouses.iter().find_map(|spouse_ref| {
                if paired.contains(&spouse_ref.id) {
                    return None;
                }
                parent_nodes
                    .get(&spouse_ref.id)
                    .map(|&node| (node, spouse_ref))
            });

            if let Some((spouse_node, spouse_ref)) = partner {
                links.push(Link::spouse(
                    spouse_node.clone(),
                    parent.clone(),
                    SpouseLinkData::from_ref(spouse_ref, None),
                ));
                paired.insert(parent.id());
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HourglassConfig;
    use crate::layout::layout_hourglass;
    use crate::model::{FamilyTreeGraph, Person};
    use crate::tree::{build_hourglass_tree, create_spouse_nodes};

    fn positioned(graph: &FamilyTreeGraph) -> (PositionedTree, PositionedTree) {
        let (descendants, ancestors) = build_hourglass_tree(graph).unwrap();
        layout_hourglass(&descendants, &ancestors, &HourglassConfig::default())
    }

    fn ends(link: &Link) -> (&str, &str) {
        (link.source.id().as_str(), link.target.id().as_str())
    }

    #[test]
    fn test_link_key_is_direction_independent() {
        let a = PersonId::from("a");
        let b = PersonId::from("b");
        assert_eq!(link_key(&a, &b), "a--b");
        assert_eq!(link_key(&b, &a), "a--b");
    }

    #[test]
    fn test_spouse_links_reversed_with_ordinals() {
        let graph = FamilyTreeGraph::new(
            "r",
            [
                Person::new("r")
                    .with_spouse(SpouseRef::new("w1").with_since(PartialDate::new(
                        Some(1950),
                        None,
                        None,
                    )))
                    .with_spouse(SpouseRef::new("w2"))
                    .with_spouse(SpouseRef::new("w3")),
                Person::new("w1"),
                Person::new("w2"),
                Person::new("w3"),
            ],
        )
        .unwrap();
        let (descendants, _) = positioned(&graph);
        let spouses = create_spouse_nodes(&graph, HourglassConfig::default().layout_width);

        let links = create_spouse_links(descendants.root(), &spouses);
        let targets: Vec<_> = links.iter().map(|l| ends(l).1).collect();
        assert_eq!(targets, ["w3", "w2", "w1"]);
        let ordinals: Vec<_> = links
            .iter()
            .map(|l| l.spouse_data().unwrap().nodes_in_between)
            .collect();
        assert_eq!(ordinals, [Some(2), Some(1), Some(0)]);
        assert_eq!(links[2].spouse_data().unwrap().since.year, Some(1950));
    }

    #[test]
    fn test_descendant_spouse_links() {
        let graph = FamilyTreeGraph::new(
            "r",
            [
                Person::new("r").with_children(["a", "b"]),
                Person::new("a")
                    .with_spouse(SpouseRef::new("gone"))
                    .with_spouse(SpouseRef::new("as")),
                Person::new("as"),
                Person::new("b").with_spouse(SpouseRef::new("bs")),
                Person::new("bs"),
            ],
        )
        .unwrap();
        let (descendants, _) = positioned(&graph);

        let links = create_descendant_spouse_links(&descendants);
        let pairs: Vec<_> = links.iter().map(ends).collect();
        assert_eq!(pairs, [("bs", "b"), ("as", "a")]);
        // Ordinal counts the cut-off spouse too
        assert_eq!(links[1].spouse_data().unwrap().nodes_in_between, Some(1));
    }

    #[test]
    fn test_ancestor_pair_linked_once() {
        let graph = FamilyTreeGraph::new(
            "r",
            [
                Person::new("r").with_parents(["f", "m"]),
                Person::new("f")
                    .with_parents(["gf", "gm"])
                    .with_spouse(SpouseRef::new("m")),
                Person::new("m").with_spouse(SpouseRef::new("f")),
                Person::new("gf").with_spouse(SpouseRef::new("gm")),
                Person::new("gm").with_spouse(SpouseRef::new("gf")),
            ],
        )
        .unwrap();
        let (_, ancestors) = positioned(&graph);

        let links = create_ancestor_spouse_links(&ancestors);
        let pairs: Vec<_> = links.iter().map(ends).collect();
        assert_eq!(pairs, [("m", "f"), ("gm", "gf")]);
        assert!(links.iter().all(|l| l.spouse_data().unwrap().nodes_in_between.is_none()));
    }

    #[test]
    fn test_ancestor_spouse_outside_pair_ignored() {
        // f's first spouse is not the other parent
        let graph = FamilyTreeGraph::new(
            "r",
            [
                Person::new("r").with_parents(["f", "m"]),
                Person::new("f")
                    .with_spouse(SpouseRef::new("x"))
                    .with_spouse(SpouseRef::new("m")),
                Person::new("m"),
                Person::new("x"),
            ],
        )
        .unwrap();
        let (_, ancestors) = positioned(&graph);

        let links = create_ancestor_spouse_links(&ancestors);
        assert_eq!(links.iter().map(ends).collect::<Vec<_>>(), [("m", "f")]);
    }

    #[test]
    fn test_sibling_links() {
        let root = PositionedNode::new(Person::new("r"), NodeRole::Root, 0.0, 0.0, 0);
        let siblings = [
            PositionedNode::new(Person::new("s1"), NodeRole::Sibling, -450.0, 0.0, 0),
            PositionedNode::new(Person::new("s2"), NodeRole::Sibling, -900.0, 0.0, 0),
        ];
        let links = create_sibling_links(&root, &siblings);
        assert_eq!(links.iter().map(ends).collect::<Vec<_>>(), [("r", "s1"), ("r", "s2")]);
        assert!(links.iter().all(|l| l.data.is_none()));
    }
}
