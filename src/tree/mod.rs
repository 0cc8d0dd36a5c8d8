//! Tree builder: DTO to descendant and ancestor trees.

mod builder;
mod node;

pub use builder::{
    build_ancestor_tree, build_descendant_tree, build_hourglass_tree, create_sibling_nodes,
    create_spouse_nodes,
};
pub use node::{NodeRole, PersonNode};
