//! Family tree data transfer objects.
//!
//! Persons reference each other by id only. A [`FamilyTreeGraph`] holds the
//! persons within some radius of a root, so any reference may dangle.

mod complete;
mod family_tree;
mod person;

pub use complete::{CompleteGraph, MarriageRelation, ParentRelation, SiblingRelation};
pub use family_tree::FamilyTreeGraph;
pub use person::{DeathState, Gender, PartialDate, Person, PersonId, SiblingRef, SpouseRef};
