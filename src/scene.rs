//! A complete, draw-ordered hourglass graph for one root.

use log::debug;

use crate::config::HourglassConfig;
use crate::layout::{calculate_bounds, layout_hourglass, Bounds, PositionedNode, PositionedTree};
use crate::links::{
    create_ancestor_spouse_links, create_descendant_spouse_links, create_sibling_links,
    create_spouse_links, Link,
};
use crate::model::{FamilyTreeGraph, PersonId};
use crate::tree::{build_hourglass_tree, create_sibling_nodes, create_spouse_nodes};

/// Nodes and links of one rebuild, in draw order.
#[derive(Debug, Clone)]
pub struct HourglassScene {
    root_id: PersonId,
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<Link>,
}

impl HourglassScene {
    /// Build and lay out the hourglass around `graph`'s root.
    ///
    /// Returns `None` when the root record is missing from the graph.
    pub fn build(graph: &FamilyTreeGraph, config: &HourglassConfig) -> Option<Self> {
        let (descendant_tree, ancestor_tree) = build_hourglass_tree(graph)?;
        let (descendants, ancestors) = layout_hourglass(&descendant_tree, &ancestor_tree, config);

        let root = descendants.root();
        let siblings = create_sibling_nodes(graph, config.layout_width);
        let spouses = create_spouse_nodes(graph, config.layout_width);

        let mut nodes = Vec::with_capacity(
            descendants.len() + ancestors.len() - 1 + siblings.len() + spouses.len(),
        );
        nodes.extend(descendants.descendants().cloned());
        nodes.extend(ancestors.descendants().skip(1).cloned());
        nodes.extend(siblings.iter().cloned());
        nodes.extend(spouses.iter().cloned());

        let mut links = tree_links(&descendants);
        links.extend(tree_links(&ancestors));
        links.extend(create_sibling_links(root, &siblings));
        links.extend(create_spouse_links(root, &spouses));
        links.extend(create_descendant_spouse_links(&descendants));
        links.extend(create_ancestor_spouse_links(&ancestors));

        debug!(
            "built hourglass around '{}': {} nodes, {} links",
            graph.root_id(),
            nodes.len(),
            links.len()
        );

        Some(Self {
            root_id: graph.root_id().clone(),
            nodes,
            links,
        })
    }

    pub fn root_id(&self) -> &PersonId {
        &self.root_id
    }

    /// The root node; always first in draw order.
    pub fn root(&self) -> &PositionedNode {
        &self.nodes[0]
    }

    /// First node drawn for `id`.
    pub fn node(&self, id: &PersonId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Pan extent for a viewport of the given size.
    pub fn bounds(&self, viewport_width: f32, viewport_height: f32) -> Bounds {
        calculate_bounds(&self.nodes, viewport_width, viewport_height)
    }
}

/// Parent/child links of a laid-out tree, injected spouse children included.
fn tree_links(tree: &PositionedTree) -> Vec<Link> {
    tree.links()
        .map(|(parent, child)| Link::new(parent.clone(), child.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Person, SpouseRef};
    use crate::tree::NodeRole;

    fn graph() -> FamilyTreeGraph {
        FamilyTreeGraph::new(
            "r",
            [
                Person::new("r")
                    .with_parents(["f", "m"])
                    .with_children(["c"])
                    .with_sibling("s", false)
                    .with_spouse(SpouseRef::new("w")),
                Person::new("c").with_spouse(SpouseRef::new("cs")),
                Person::new("cs"),
                Person::new("f").with_spouse(SpouseRef::new("m")),
                Person::new("m").with_spouse(SpouseRef::new("f")),
                Person::new("s"),
                Person::new("w"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_node_order() {
        let scene = HourglassScene::build(&graph(), &HourglassConfig::default()).unwrap();
        let ids: Vec<_> = scene.nodes.iter().map(|n| n.id().as_str()).collect();
        assert_eq!(ids, ["r", "c", "cs", "f", "m", "s", "w"]);
        assert_eq!(scene.root().role, NodeRole::Root);
        assert_eq!(scene.root_id().as_str(), "r");
    }

    #[test]
    fn test_link_order() {
        let scene = HourglassScene::build(&graph(), &HourglassConfig::default()).unwrap();
        let keys: Vec<_> = scene.links.iter().map(Link::key).collect();
        assert_eq!(
            keys,
            ["c--r", "cs--r", "f--r", "m--r", "r--s", "r--w", "c--cs", "f--m"]
        );

        // The injected spouse keeps its tree link next to the marriage line
        let cs_parent = scene.links.iter().find(|link| link.key() == "cs--r").unwrap();
        assert!(cs_parent.data.is_none());
        assert_eq!(cs_parent.target.role, NodeRole::DescendantSpouse);
    }

    #[test]
    fn test_missing_root() {
        let mut graph = graph();
        graph.persons.clear();
        assert!(HourglassScene::build(&graph, &HourglassConfig::default()).is_none());
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let scene = HourglassScene::build(&graph(), &HourglassConfig::default()).unwrap();
        let bounds = scene.bounds(1000.0, 800.0);
        assert!(scene.nodes.iter().all(|n| bounds.contains(n.x, n.y)));
    }
}
