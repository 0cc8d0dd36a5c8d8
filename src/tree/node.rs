//! Materialized tree node and its semantic role.

use std::fmt;

use serde::Serialize;

use crate::model::{Person, PersonId};

/// Semantic role of a node in the hourglass graph.
///
/// Drives class names, link routing and render layering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    Root,
    Ancestor,
    Descendant,
    Sibling,
    RootSpouse,
    DescendantSpouse,
}

impl NodeRole {
    /// Class-name form (`"root-spouse"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRole::Root => "root",
            NodeRole::Ancestor => "ancestor",
            NodeRole::Descendant => "descendant",
            NodeRole::Sibling => "sibling",
            NodeRole::RootSpouse => "root-spouse",
            NodeRole::DescendantSpouse => "descendant-spouse",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person together with its materialized children in one of the two trees.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonNode {
    pub person: Person,
    pub role: NodeRole,
    pub children: Vec<PersonNode>,
}

impl PersonNode {
    /// A node without children.
    pub fn leaf(person: Person, role: NodeRole) -> Self {
        Self {
            person,
            role,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &PersonId {
        &self.person.id
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(PersonNode::size).sum::<usize>()
    }
}
