//! In-memory family tree source.
//!
//! Holds the complete graph and cuts radius-bounded family trees out of it,
//! the way the family tree endpoint does: shortest relational distance over
//! any relation, reference lists filled from the relations, deterministic
//! ordering, and generation levels relative to the root.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use log::debug;
use petgraph::stable_graph::{NodeIndex, StableUnGraph};

use super::FamilyTreeSource;
use crate::error::FetchError;
use crate::model::{
    CompleteGraph, FamilyTreeGraph, MarriageRelation, ParentRelation, Person, PersonId,
    SiblingRef, SiblingRelation, SpouseRef,
};

/// Serves family trees from a [`CompleteGraph`].
pub struct LocalSource {
    persons: HashMap<PersonId, Person>,
    graph: StableUnGraph<PersonId, ()>,
    indices: HashMap<PersonId, NodeIndex>,
    marriages: Vec<MarriageRelation>,
    parents: Vec<ParentRelation>,
    siblings: Vec<SiblingRelation>,
    fetches: usize,
}

impl LocalSource {
    pub fn new(complete: CompleteGraph) -> Self {
        let mut graph = StableUnGraph::default();
        let mut indices = HashMap::with_capacity(complete.persons.len());
        let mut persons = HashMap::with_capacity(complete.persons.len());

        for person in complete.persons {
            let id = person.id.clone();
            if !indices.contains_key(&id) {
                indices.insert(id.clone(), graph.add_node(id.clone()));
            }
            persons.insert(id, person);
        }

        let pairs = complete
            .marriages
            .iter()
            .map(|m| (&m.person1_id, &m.person2_id))
            .chain(complete.parents.iter().map(|p| (&p.parent_id, &p.child_id)))
            .chain(
                complete
                    .siblings
                    .iter()
                    .map(|s| (&s.person1_id, &s.person2_id)),
            );
        for (a, b) in pairs {
            // Relations to unknown persons do not connect anything
            if let (Some(&a), Some(&b)) = (indices.get(a), indices.get(b)) {
                graph.add_edge(a, b, ());
            }
        }

        Self {
            persons,
            graph,
            indices,
            marriages: complete.marriages,
            parents: complete.parents,
            siblings: complete.siblings,
            fetches: 0,
        }
    }

    /// Parse the complete graph wire JSON.
    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        let complete: CompleteGraph = serde_json::from_str(json)?;
        Ok(Self::new(complete))
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// The family tree around `root`, limited to `max_distance` relations.
    pub fn family_tree(
        &self,
        root: &PersonId,
        max_distance: Option<u32>,
    ) -> Result<FamilyTreeGraph, FetchError> {
        let start = *self
            .indices
            .get(root)
            .ok_or_else(|| FetchError::NotFound(root.clone()))?;

        let mut persons: BTreeMap<PersonId, Person> = self
            .distances(start, max_distance)
            .into_iter()
            .filter_map(|(id, distance)| {
                let mut person = self.persons.get(&id)?.clone();
                person.distance = distance;
                person.level = 0;
                person.parents.clear();
                person.children.clear();
                person.siblings.clear();
                person.spouses.clear();
                Some((id, person))
            })
            .collect();

        self.relate_spouses(&mut persons);
        self.relate_parents_and_children(&mut persons);
        self.relate_siblings(&mut persons);
        assign_levels(&mut persons, root);

        debug!(
            "cut family tree around '{root}' with {} of {} persons",
            persons.len(),
            self.persons.len()
        );

        FamilyTreeGraph::new(root.clone(), persons.into_values())
            .ok_or_else(|| FetchError::NotFound(root.clone()))
    }

    /// Shortest distances from `start` over any relation, cut at `max`.
    fn distances(&self, start: NodeIndex, max: Option<u32>) -> Vec<(PersonId, u32)> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue = VecDeque::from([(start, 0u32)]);
        let mut found = Vec::new();
        visited.insert(start);

        while let Some((index, distance)) = queue.pop_front() {
            if let Some(id) = self.graph.node_weight(index) {
                found.push((id.clone(), distance));
            }
            if max.is_some_and(|max| distance >= max) {
                continue;
            }
            for neighbor in self.graph.neighbors(index) {
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, distance + 1));
                }
            }
        }
        found
    }

    fn relate_spouses(&self, persons: &mut BTreeMap<PersonId, Person>) {
        for marriage in &self.marriages {
            let spouse_ref = |id: &PersonId| SpouseRef {
                id: id.clone(),
                since_year: marriage.since_year,
                since_month: marriage.since_month,
                since_day: marriage.since_day,
                until_year: marriage.until_year,
                until_month: marriage.until_month,
                until_day: marriage.until_day,
            };
            if let Some(person) = persons.get_mut(&marriage.person1_id) {
                person.spouses.push(spouse_ref(&marriage.person2_id));
            }
            if let Some(person) = persons.get_mut(&marriage.person2_id) {
                person.spouses.push(spouse_ref(&marriage.person1_id));
            }
        }

        // Latest marriage first
        for person in persons.values_mut() {
            person
                .spouses
                .sort_by(|a, b| b.since().sort_key().cmp(&a.since().sort_key()));
        }
    }

    fn relate_parents_and_children(&self, persons: &mut BTreeMap<PersonId, Person>) {
        for relation in &self.parents {
            if let Some(parent) = persons.get_mut(&relation.parent_id) {
                parent.children.push(relation.child_id.clone());
            }
            if let Some(child) = persons.get_mut(&relation.child_id) {
                child.parents.push(relation.parent_id.clone());
            }
        }

        let birth_keys = birth_keys(persons);
        let female: HashSet<PersonId> = persons
            .values()
            .filter(|person| person.gender.as_deref() == Some("f"))
            .map(|person| person.id.clone())
            .collect();

        for person in persons.values_mut() {
            // Father first when both parents are known
            if person.parents.len() == 2 && female.contains(&person.parents[0]) {
                person.parents.swap(0, 1);
            }
            person
                .children
                .sort_by_key(|id| birth_keys.get(id).copied().unwrap_or_default());
        }
    }

    fn relate_siblings(&self, persons: &mut BTreeMap<PersonId, Person>) {
        for relation in &self.siblings {
            if let Some(person) = persons.get_mut(&relation.person1_id) {
                person.siblings.push(SiblingRef {
                    id: relation.person2_id.clone(),
                    is_half: relation.is_half,
                });
            }
            if let Some(person) = persons.get_mut(&relation.person2_id) {
                person.siblings.push(SiblingRef {
                    id: relation.person1_id.clone(),
                    is_half: relation.is_half,
                });
            }
        }

        let birth_keys = birth_keys(persons);
        for person in persons.values_mut() {
            person
                .siblings
                .sort_by_key(|sibling| birth_keys.get(&sibling.id).copied().unwrap_or_default());
        }
    }
}

impl FamilyTreeSource for LocalSource {
    fn fetch_family_tree(
        &mut self,
        root: &PersonId,
        distance: Option<u32>,
    ) -> Result<FamilyTreeGraph, FetchError> {
        self.fetches += 1;
        self.family_tree(root, distance)
    }
}

fn birth_keys(persons: &BTreeMap<PersonId, Person>) -> HashMap<PersonId, (i32, i32, i32)> {
    persons
        .values()
        .map(|person| (person.id.clone(), person.birth_date().sort_key()))
        .collect()
}

/// Generation relative to the root, breadth first over parent/child links.
fn assign_levels(persons: &mut BTreeMap<PersonId, Person>, root: &PersonId) {
    let mut visited: HashSet<PersonId> = HashSet::new();
    let mut queue = VecDeque::from([(root.clone(), 0i32)]);

    while let Some((id, level)) = queue.pop_front() {
        if !visited.insert(id.clone()) {
            continue;
        }
        let Some(person) = persons.get_mut(&id) else {
            continue;
        };
        person.level = level;

        let next: Vec<(PersonId, i32)> = person
            .parents
            .iter()
            .map(|parent| (parent.clone(), level - 1))
            .chain(person.children.iter().map(|child| (child.clone(), level + 1)))
            .collect();
        queue.extend(next.into_iter().filter(|(id, _)| persons.contains_key(id)));
    }
}
