//! Filter-option derivation.
//!
//! Given the full collection, collects the distinct homeworld, species and
//! film URLs the characters reference, resolves each one to a display label
//! through the [`ResourceSource`], and returns three label-sorted lists.
//!
//! Resolution is best effort: a URL that fails to resolve (or resolves to a
//! body without a label) gets a label derived from its trailing numeric path
//! segment instead of failing the batch.
//!
//! # Concurrency
//!
//! The three kinds resolve concurrently. Within a kind, at most
//! `concurrency` requests are in flight at once. The deriver waits for every
//! resolution before returning; there are no partial results.

use std::cmp::Ordering;
use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Character, FilterOption, FilterOptions};
use crate::source::ResourceSource;

/// Default bound on in-flight label resolutions per kind.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// The kinds of resource a character references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Homeworld,
    Species,
    Film,
}

impl ResourceKind {
    /// JSON field holding the display label.
    pub fn label_field(self) -> &'static str {
        match self {
            ResourceKind::Film => "title",
            ResourceKind::Homeworld | ResourceKind::Species => "name",
        }
    }

    /// Label used when the resource cannot be resolved.
    pub fn fallback_label(self, url: &str) -> String {
        let id = trailing_segment(url);
        match self {
            ResourceKind::Film => format!("Film {}", id),
            ResourceKind::Homeworld | ResourceKind::Species => id.to_string(),
        }
    }

    /// Distinct URLs of this kind across `characters`, in first-seen order.
    pub fn distinct_urls(self, characters: &[Character]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for c in characters {
            let refs: &[String] = match self {
                ResourceKind::Homeworld => c.homeworld.as_slice(),
                ResourceKind::Species => &c.species,
                ResourceKind::Film => &c.films,
            };
            for url in refs {
                if seen.insert(url.as_str()) {
                    urls.push(url.clone());
                }
            }
        }
        urls
    }
}

/// Last non-empty path segment of a resource URL (`.../planets/7/` -> `7`).
pub fn trailing_segment(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

/// Locale-style label ordering.
///
/// Primary key ignores accents and case (`"Éclair"` sorts with `"eclair"`),
/// then case-insensitive with accents, then exact text.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| lowercase(a).cmp(&lowercase(b)))
        .then_with(|| a.cmp(b))
}

fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn lowercase(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Sort options by label, breaking ties on URL so output is deterministic.
pub fn sort_options(options: &mut [FilterOption]) {
    options.sort_by(|a, b| compare_labels(&a.label, &b.label).then_with(|| a.url.cmp(&b.url)));
}

/// Resolve one URL to a labelled option, falling back on any failure.
pub async fn resolve_option<S>(source: &S, kind: ResourceKind, url: String) -> FilterOption
where
    S: ResourceSource + ?Sized,
{
    let label = match source.fetch_resource(&url).await {
        Ok(body) => body
            .get(kind.label_field())
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "label resolution failed");
            None
        }
    };
    let label = label.unwrap_or_else(|| kind.fallback_label(&url));
    FilterOption { url, label }
}

/// Resolve every URL of one kind with bounded concurrency, sorted by label.
pub async fn resolve_kind<S>(
    source: &S,
    kind: ResourceKind,
    urls: Vec<String>,
    concurrency: usize,
) -> Vec<FilterOption>
where
    S: ResourceSource + ?Sized,
{
    let mut options: Vec<FilterOption> = stream::iter(urls)
        .map(move |url| resolve_option(source, kind, url))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    sort_options(&mut options);
    options
}

/// Derive the homeworld, species and film option lists from `characters`.
///
/// Returns three empty lists without touching the source when
/// `characters` is empty.
pub async fn derive_filter_options<S>(
    source: &S,
    characters: &[Character],
    concurrency: usize,
) -> FilterOptions
where
    S: ResourceSource + ?Sized,
{
    if characters.is_empty() {
        return FilterOptions::default();
    }

    let homeworld_urls = ResourceKind::Homeworld.distinct_urls(characters);
    let species_urls = ResourceKind::Species.distinct_urls(characters);
    let film_urls = ResourceKind::Film.distinct_urls(characters);

    let (homeworlds, species, films) = futures_util::join!(
        resolve_kind(source, ResourceKind::Homeworld, homeworld_urls, concurrency),
        resolve_kind(source, ResourceKind::Species, species_urls, concurrency),
        resolve_kind(source, ResourceKind::Film, film_urls, concurrency),
    );

    tracing::debug!(
        homeworlds = homeworlds.len(),
        species = species.len(),
        films = films.len(),
        "filter options derived"
    );

    FilterOptions {
        homeworlds,
        species,
        films,
    }
}
