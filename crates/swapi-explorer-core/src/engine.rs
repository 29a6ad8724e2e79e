//! Search and filter engine.
//!
//! Decides which source set to filter (the current page or the full
//! collection) and produces the displayed list.
//!
//! # Source selection
//!
//! When a search or any filter is active and the full collection is
//! available, filtering runs over the full collection; otherwise it runs
//! over the current page. A homeworld filter restricted to ten characters
//! would almost always come back empty.
//!
//! # Predicates
//!
//! Applied in a fixed order, AND-combined:
//!
//! 1. Name contains the trimmed query, case-insensitively.
//! 2. Homeworld URL equals the selected homeworld.
//! 3. Species list contains the selected species.
//! 4. Film list contains the selected film.
//!
//! Output keeps the relative order of the source list.

use crate::models::{Character, FilterSelection, SearchQuery};

/// Whether a search or filter is active, independent of data availability.
pub fn is_narrowed(query: &SearchQuery, selection: &FilterSelection) -> bool {
    query.is_active() || selection.is_active()
}

/// Whether the engine filters over the full collection.
pub fn uses_full_collection(
    query: &SearchQuery,
    selection: &FilterSelection,
    full: &[Character],
) -> bool {
    is_narrowed(query, selection) && !full.is_empty()
}

/// Check one character against every active predicate.
pub fn matches(character: &Character, needle: Option<&str>, selection: &FilterSelection) -> bool {
    if let Some(needle) = needle {
        if !character.name.to_lowercase().contains(needle) {
            return false;
        }
    }

    if let Some(homeworld) = &selection.homeworld {
        if character.homeworld.as_ref() != Some(homeworld) {
            return false;
        }
    }

    if let Some(species) = &selection.species {
        if !character.species.contains(species) {
            return false;
        }
    }

    if let Some(film) = &selection.film {
        if !character.films.contains(film) {
            return false;
        }
    }

    true
}

/// Compute the displayed list.
pub fn display_list(
    query: &SearchQuery,
    selection: &FilterSelection,
    page: &[Character],
    full: &[Character],
) -> Vec<Character> {
    let source = if uses_full_collection(query, selection, full) {
        full
    } else {
        page
    };

    let needle = query.is_active().then(|| query.trimmed().to_lowercase());

    source
        .iter()
        .filter(|c| matches(c, needle.as_deref(), selection))
        .cloned()
        .collect()
}
