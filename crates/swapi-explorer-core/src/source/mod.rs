//! Remote source abstraction for swapi-explorer.
//!
//! The [`ResourceSource`] trait defines the read operations the core needs
//! from the reference API, enabling pluggable backends (the HTTP client in
//! the application crate, the in-memory source used by tests).
//!
//! Implementations are stateless with respect to caching: callers own
//! every cache built from the data they return.

pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::models::{Character, Page};

/// Read-only access to the reference API.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`root`](ResourceSource::root) | Canonical collection root URL |
/// | [`fetch_page_url`](ResourceSource::fetch_page_url) | One page at an explicit URL |
/// | [`fetch_resource`](ResourceSource::fetch_resource) | One resource as raw JSON |
/// | [`fetch_page`](ResourceSource::fetch_page) | One numbered page |
/// | [`fetch_all_characters`](ResourceSource::fetch_all_characters) | Walk every page |
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// The collection root, e.g. `https://swapi.dev/api/people/`.
    fn root(&self) -> &str;

    /// Fetch the page of characters at `url`.
    async fn fetch_page_url(&self, url: &str) -> Result<Page<Character>>;

    /// Fetch and parse one resource.
    async fn fetch_resource(&self, url: &str) -> Result<serde_json::Value>;

    /// Fetch a 1-based page of the character collection.
    async fn fetch_page(&self, page: u64) -> Result<Page<Character>> {
        let url = page_url(self.root(), page);
        self.fetch_page_url(&url).await
    }

    /// Fetch every character by following `next` links from the root.
    ///
    /// Pages are fetched one after another since each URL comes from the
    /// previous response. A failure on any page fails the whole walk, and
    /// so does a `next` link pointing back at a page already fetched.
    async fn fetch_all_characters(&self) -> Result<Vec<Character>> {
        let mut all = Vec::new();
        let mut next = Some(self.root().to_string());
        let mut visited = HashSet::new();
        let mut pages = 0usize;

        while let Some(url) = next {
            if !visited.insert(url.clone()) {
                return Err(Error::network(format!(
                    "Failed to fetch: pagination loops back to {}",
                    url
                )));
            }
            let page = self.fetch_page_url(&url).await?;
            pages += 1;
            all.extend(page.results);
            next = page.next.filter(|n| !n.is_empty());
        }

        tracing::debug!(pages, characters = all.len(), "fetched full collection");
        Ok(all)
    }
}

/// Build the URL of a numbered page under `root`.
pub fn page_url(root: &str, page: u64) -> String {
    let sep = if root.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", root, sep, page)
}

/// Fetch one resource and deserialize it into `T`.
///
/// A body that does not match `T` is reported as a network error.
pub async fn fetch_typed<S, T>(source: &S, url: &str) -> Result<T>
where
    S: ResourceSource + ?Sized,
    T: DeserializeOwned,
{
    let value = source.fetch_resource(url).await?;
    serde_json::from_value(value).map_err(Error::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        assert_eq!(
            page_url("https://swapi.dev/api/people/", 3),
            "https://swapi.dev/api/people/?page=3"
        );
        assert_eq!(
            page_url("http://localhost/people/?format=json", 2),
            "http://localhost/people/?format=json&page=2"
        );
    }
}
