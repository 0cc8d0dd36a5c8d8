//! Person record and the id-only references it carries.
//!
//! The field names follow the wire format of the family tree endpoint
//! (`PascalCase`, optional fields omitted). Derived views such as [`Gender`],
//! [`DeathState`] and [`PartialDate`] are computed on access so that a record
//! survives a deserialize/serialize cycle unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable person identifier.
///
/// Opaque to this crate: it is only compared, hashed and displayed. It stays
/// valid across re-roots, which is what makes it usable as a render key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    /// Create a new PersonId.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PersonId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Gender as used for node coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Interpret the wire value (`"m"`, `"f"`, anything else).
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("m") => Gender::Male,
            Some("f") => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Tri-state death flag. `Unknown` is distinct from `Alive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathState {
    Alive,
    Dead,
    Unknown,
}

impl DeathState {
    pub fn from_flag(is_dead: Option<bool>) -> Self {
        match is_dead {
            Some(false) => DeathState::Alive,
            Some(true) => DeathState::Dead,
            None => DeathState::Unknown,
        }
    }

    /// Marker class used by the renderer.
    pub fn as_str(self) -> &'static str {
        match self {
            DeathState::Alive => "alive",
            DeathState::Dead => "dead",
            DeathState::Unknown => "unknown",
        }
    }
}

/// A date where every component may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
}

impl PartialDate {
    pub fn new(year: Option<i32>, month: Option<i32>, day: Option<i32>) -> Self {
        Self { year, month, day }
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }

    /// `dd.mm.yyyy`, with `??` / `????` standing in for missing parts.
    pub fn to_dotted(&self) -> String {
        let day = self.day.map_or_else(|| "??".to_owned(), |d| d.to_string());
        let month = self.month.map_or_else(|| "??".to_owned(), |m| m.to_string());
        let year = self.year.map_or_else(|| "????".to_owned(), |y| y.to_string());
        format!("{day}.{month}.{year}")
    }

    /// Ordering key with missing components treated as 0.
    pub fn sort_key(&self) -> (i32, i32, i32) {
        (
            self.year.unwrap_or(0),
            self.month.unwrap_or(0),
            self.day.unwrap_or(0),
        )
    }
}

/// Sibling reference of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiblingRef {
    pub id: PersonId,
    #[serde(default)]
    pub is_half: bool,
}

/// Spouse reference of a person, carrying the marriage's partial dates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpouseRef {
    pub id: PersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_month: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_day: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_month: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_day: Option<i32>,
}

impl SpouseRef {
    pub fn new(id: impl Into<PersonId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_since(mut self, date: PartialDate) -> Self {
        self.since_year = date.year;
        self.since_month = date.month;
        self.since_day = date.day;
        self
    }

    pub fn with_until(mut self, date: PartialDate) -> Self {
        self.until_year = date.year;
        self.until_month = date.month;
        self.until_day = date.day;
        self
    }

    /// Start of the marriage.
    pub fn since(&self) -> PartialDate {
        PartialDate::new(self.since_year, self.since_month, self.since_day)
    }

    /// End of the marriage.
    pub fn until(&self) -> PartialDate {
        PartialDate::new(self.until_year, self.until_month, self.until_day)
    }
}

/// A person as delivered by the family tree endpoint.
///
/// Relations are id-only references. Any referenced id may be absent from
/// the surrounding graph when the query radius cut it off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    pub id: PersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dead: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date_month: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date_day: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date_month: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date_day: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    /// Generation relative to the query root (parents -1, children +1).
    #[serde(default)]
    pub level: i32,
    /// Relational distance from the query root.
    #[serde(default)]
    pub distance: u32,
    #[serde(default)]
    pub parents: Vec<PersonId>,
    #[serde(default)]
    pub children: Vec<PersonId>,
    #[serde(default)]
    pub siblings: Vec<SiblingRef>,
    #[serde(default)]
    pub spouses: Vec<SpouseRef>,
}

impl Person {
    /// Create a person with no data besides the id.
    pub fn new(id: impl Into<PersonId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, first: &str, last: &str) -> Self {
        self.first_name = Some(first.to_owned());
        self.last_name = Some(last.to_owned());
        self
    }

    pub fn with_gender(mut self, code: &str) -> Self {
        self.gender = Some(code.to_owned());
        self
    }

    pub fn with_dead(mut self, is_dead: Option<bool>) -> Self {
        self.is_dead = is_dead;
        self
    }

    pub fn with_birth_date(mut self, date: PartialDate) -> Self {
        self.birth_date_year = date.year;
        self.birth_date_month = date.month;
        self.birth_date_day = date.day;
        self
    }

    pub fn with_parents<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PersonId>,
    {
        self.parents = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_children<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PersonId>,
    {
        self.children = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sibling(mut self, id: impl Into<PersonId>, is_half: bool) -> Self {
        self.siblings.push(SiblingRef {
            id: id.into(),
            is_half,
        });
        self
    }

    pub fn with_spouse(mut self, spouse: SpouseRef) -> Self {
        self.spouses.push(spouse);
        self
    }

    pub fn gender(&self) -> Gender {
        Gender::from_code(self.gender.as_deref())
    }

    pub fn death_state(&self) -> DeathState {
        DeathState::from_flag(self.is_dead)
    }

    pub fn birth_date(&self) -> PartialDate {
        PartialDate::new(
            self.birth_date_year,
            self.birth_date_month,
            self.birth_date_day,
        )
    }

    pub fn death_date(&self) -> PartialDate {
        PartialDate::new(
            self.death_date_year,
            self.death_date_month,
            self.death_date_day,
        )
    }

    /// `"{first} {last}"`, missing parts left empty.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
    }

    /// The spouse reference pointing at `id`, if any.
    pub fn spouse_ref(&self, id: &PersonId) -> Option<&SpouseRef> {
        self.spouses.iter().find(|spouse| &spouse.id == id)
    }
}
