//! Character detail view.
//!
//! Display-ready fields for a single character and its homeworld, with the
//! API's `"unknown"` sentinels turned into readable text.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Character, Homeworld};
use crate::source::{fetch_typed, ResourceSource};

const UNKNOWN: &str = "Unknown";

/// Formatted character detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterDetail {
    pub name: String,
    pub url: String,
    pub height: String,
    pub mass: String,
    pub birth_year: String,
    pub films: String,
    pub date_added: String,
    pub homeworld: Option<HomeworldDetail>,
}

/// Formatted homeworld block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeworldDetail {
    pub name: String,
    pub terrain: String,
    pub climate: String,
    pub population: String,
}

impl CharacterDetail {
    pub fn new(character: &Character, homeworld: Option<&Homeworld>) -> Self {
        Self {
            name: character.name.clone(),
            url: character.url.clone(),
            height: with_unit(&character.height, "cm"),
            mass: with_unit(&character.mass, "kg"),
            birth_year: or_unknown(&character.birth_year),
            films: film_count(character.films.len()),
            date_added: format_date(&character.created),
            homeworld: homeworld.map(HomeworldDetail::new),
        }
    }
}

impl HomeworldDetail {
    pub fn new(h: &Homeworld) -> Self {
        Self {
            name: h.name.clone(),
            terrain: h.terrain.clone(),
            climate: h.climate.clone(),
            population: format_population(&h.population),
        }
    }
}

/// Fetch a character by URL, then its homeworld, and format both.
///
/// The character is re-fetched rather than taken from a cache so the view
/// always reflects the resource itself. Any failure fails the whole view.
pub async fn load_detail<S>(source: &S, url: &str) -> Result<CharacterDetail>
where
    S: ResourceSource + ?Sized,
{
    let character: Character = fetch_typed(source, url).await?;
    let homeworld: Option<Homeworld> = match &character.homeworld {
        Some(hw) => Some(fetch_typed(source, hw).await?),
        None => None,
    };
    Ok(CharacterDetail::new(&character, homeworld.as_ref()))
}

fn is_unknown(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("unknown")
}

fn or_unknown(value: &str) -> String {
    if is_unknown(value) {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

/// `"172"` -> `"172 cm"`; the sentinel stays `"Unknown"`.
pub fn with_unit(value: &str, unit: &str) -> String {
    if is_unknown(value) {
        UNKNOWN.to_string()
    } else {
        format!("{} {}", value, unit)
    }
}

pub fn film_count(n: usize) -> String {
    if n == 1 {
        "1 film".to_string()
    } else {
        format!("{} films", n)
    }
}

/// ISO-8601 timestamp to `dd-MM-yyyy`, `"N/A"` if absent or unparsable.
pub fn format_date(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "N/A".to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format("%d-%m-%Y").to_string();
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(d) => d.format("%d-%m-%Y").to_string(),
        Err(_) => "N/A".to_string(),
    }
}

/// `"200000"` -> `"200,000"`. Non-numeric values pass through unchanged.
pub fn format_population(value: &str) -> String {
    if is_unknown(value) {
        return UNKNOWN.to_string();
    }
    match value.trim().parse::<u64>() {
        Ok(n) => format_number(n),
        Err(_) => value.to_string(),
    }
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}
