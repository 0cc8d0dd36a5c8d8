//! Unbounded graph of every person and relation, as served by the complete
//! graph endpoint. [`crate::source::LocalSource`] cuts family trees out of it.

use serde::{Deserialize, Serialize};

use super::person::{PartialDate, Person, PersonId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarriageRelation {
    pub person1_id: PersonId,
    pub person2_id: PersonId,
    #[serde(default)]
    pub since_year: Option<i32>,
    #[serde(default)]
    pub since_month: Option<i32>,
    #[serde(default)]
    pub since_day: Option<i32>,
    #[serde(default)]
    pub until_year: Option<i32>,
    #[serde(default)]
    pub until_month: Option<i32>,
    #[serde(default)]
    pub until_day: Option<i32>,
}

impl MarriageRelation {
    pub fn new(a: impl Into<PersonId>, b: impl Into<PersonId>) -> Self {
        Self {
            person1_id: a.into(),
            person2_id: b.into(),
            since_year: None,
            since_month: None,
            since_day: None,
            until_year: None,
            until_month: None,
            until_day: None,
        }
    }

    pub fn with_since(mut self, date: PartialDate) -> Self {
        self.since_year = date.year;
        self.since_month = date.month;
        self.since_day = date.day;
        self
    }

    pub fn since(&self) -> PartialDate {
        PartialDate::new(self.since_year, self.since_month, self.since_day)
    }

    pub fn until(&self) -> PartialDate {
        PartialDate::new(self.until_year, self.until_month, self.until_day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentRelation {
    pub parent_id: PersonId,
    pub child_id: PersonId,
}

impl ParentRelation {
    pub fn new(parent: impl Into<PersonId>, child: impl Into<PersonId>) -> Self {
        Self {
            parent_id: parent.into(),
            child_id: child.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiblingRelation {
    pub person1_id: PersonId,
    pub person2_id: PersonId,
    #[serde(default)]
    pub is_half: bool,
}

impl SiblingRelation {
    pub fn new(a: impl Into<PersonId>, b: impl Into<PersonId>, is_half: bool) -> Self {
        Self {
            person1_id: a.into(),
            person2_id: b.into(),
            is_half,
        }
    }
}

/// All persons and relations. Person records here carry no reference lists;
/// relations live in the three relation vectors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompleteGraph {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub marriages: Vec<MarriageRelation>,
    #[serde(default)]
    pub parents: Vec<ParentRelation>,
    #[serde(default)]
    pub siblings: Vec<SiblingRelation>,
}
