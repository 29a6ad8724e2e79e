//! Core data models used throughout swapi-explorer.
//!
//! These types mirror the JSON shapes returned by the reference API
//! (characters, pages, planets) plus the derived records the engine
//! works with (filter selections and filter options).

use serde::{Deserialize, Deserializer, Serialize};

/// Number of results per page. Fixed by the remote service.
pub const PAGE_SIZE: u64 = 10;

/// A person resource. Identity is the resource `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default = "unknown")]
    pub height: String,
    #[serde(default = "unknown")]
    pub mass: String,
    #[serde(default = "unknown")]
    pub birth_year: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub species: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub films: Vec<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub homeworld: Option<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub url: String,
}

fn unknown() -> String {
    "unknown".to_string()
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A planet resource, as shown in the character detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Homeworld {
    pub name: String,
    #[serde(default = "unknown")]
    pub terrain: String,
    #[serde(default = "unknown")]
    pub climate: String,
    #[serde(default = "unknown")]
    pub population: String,
}

/// Active filter constraints. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub homeworld: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub species: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub film: Option<String>,
}

impl FilterSelection {
    /// Build a selection, treating blank strings as unset.
    pub fn new(
        homeworld: Option<String>,
        species: Option<String>,
        film: Option<String>,
    ) -> Self {
        Self {
            homeworld: normalize(homeworld),
            species: normalize(species),
            film: normalize(film),
        }
    }

    pub fn is_active(&self) -> bool {
        self.homeworld.is_some() || self.species.is_some() || self.film.is_some()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Free-text name search. Whitespace-only text is no search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn trimmed(&self) -> &str {
        self.0.trim()
    }

    pub fn is_active(&self) -> bool {
        !self.trimmed().is_empty()
    }
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A selectable filter value: resource URL plus display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub url: String,
    pub label: String,
}

/// The three derived option lists, each sorted by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub homeworlds: Vec<FilterOption>,
    pub species: Vec<FilterOption>,
    pub films: Vec<FilterOption>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.homeworlds.is_empty() && self.species.is_empty() && self.films.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize(Option::<String>::deserialize(deserializer)?))
}
