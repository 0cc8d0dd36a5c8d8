//! Radius-bounded family tree as returned by the fetch collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::person::{Person, PersonId};
use crate::error::FetchError;

/// A root person plus every person within the queried radius.
///
/// References held by the persons may point outside of `persons`; lookups
/// return `None` for those and callers drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FamilyTreeGraph {
    pub root: Person,
    pub persons: BTreeMap<PersonId, Person>,
}

impl FamilyTreeGraph {
    /// Assemble a graph from its persons. Returns `None` if the root is not
    /// among them.
    pub fn new<I>(root_id: impl Into<PersonId>, persons: I) -> Option<Self>
    where
        I: IntoIterator<Item = Person>,
    {
        let root_id = root_id.into();
        let persons: BTreeMap<PersonId, Person> = persons
            .into_iter()
            .map(|person| (person.id.clone(), person))
            .collect();
        let root = persons.get(&root_id)?.clone();
        Some(Self { root, persons })
    }

    /// Parse the wire JSON.
    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn root_id(&self) -> &PersonId {
        &self.root.id
    }

    /// The root record, preferring the copy inside `persons`.
    pub fn root(&self) -> &Person {
        self.persons.get(&self.root.id).unwrap_or(&self.root)
    }

    /// Look up a person. `None` means "not present in this view".
    #[inline]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.persons.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &PersonId) -> bool {
        self.persons.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
