//! In-memory [`ResourceSource`] implementation for testing and offline use.
//!
//! Pages and resources are stored in `HashMap`s behind `std::sync::RwLock`.
//! Individual URLs can be marked as failing to exercise error paths, and
//! every request is recorded so tests can assert on fetch counts.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{page_url, ResourceSource};
use crate::error::{Error, Result};
use crate::models::{Character, Page, PAGE_SIZE};

/// In-memory source serving canned pages and resources.
pub struct InMemorySource {
    root: String,
    pages: RwLock<HashMap<String, Page<Character>>>,
    resources: RwLock<HashMap<String, serde_json::Value>>,
    failing: RwLock<HashSet<String>>,
    requests: RwLock<Vec<String>>,
}

impl InMemorySource {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pages: RwLock::new(HashMap::new()),
            resources: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Split `characters` into pages of [`PAGE_SIZE`] linked by `next`.
    ///
    /// Page 1 is reachable both at the bare root and at `?page=1`.
    pub fn with_characters(root: impl Into<String>, characters: Vec<Character>) -> Self {
        let source = Self::new(root);
        let count = characters.len() as u64;
        let chunks: Vec<Vec<Character>> = characters
            .chunks(PAGE_SIZE as usize)
            .map(|c| c.to_vec())
            .collect();
        let total = chunks.len().max(1) as u64;

        {
            let mut pages = source.pages.write().unwrap();
            if chunks.is_empty() {
                let empty = Page {
                    count: 0,
                    next: None,
                    previous: None,
                    results: Vec::new(),
                };
                pages.insert(source.root.clone(), empty.clone());
                pages.insert(page_url(&source.root, 1), empty);
            }
            for (i, results) in chunks.into_iter().enumerate() {
                let n = i as u64 + 1;
                let page = Page {
                    count,
                    next: (n < total).then(|| page_url(&source.root, n + 1)),
                    previous: (n > 1).then(|| page_url(&source.root, n - 1)),
                    results,
                };
                if n == 1 {
                    pages.insert(source.root.clone(), page.clone());
                }
                pages.insert(page_url(&source.root, n), page);
            }
        }

        source
    }

    /// Serve `page` at `url`, replacing any page already there.
    pub fn insert_page(&self, url: impl Into<String>, page: Page<Character>) {
        self.pages.write().unwrap().insert(url.into(), page);
    }

    /// Register a resource body served at `url`.
    pub fn insert_resource(&self, url: impl Into<String>, body: serde_json::Value) {
        self.resources.write().unwrap().insert(url.into(), body);
    }

    /// Make every request for `url` fail with a network error.
    pub fn fail_url(&self, url: impl Into<String>) {
        self.failing.write().unwrap().insert(url.into());
    }

    /// Stop failing `url`.
    pub fn heal_url(&self, url: &str) {
        self.failing.write().unwrap().remove(url);
    }

    /// All URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    fn record(&self, url: &str) -> Result<()> {
        self.requests.write().unwrap().push(url.to_string());
        if self.failing.read().unwrap().contains(url) {
            return Err(Error::network(format!(
                "Failed to fetch: HTTP error! status: 500 ({})",
                url
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceSource for InMemorySource {
    fn root(&self) -> &str {
        &self.root
    }

    async fn fetch_page_url(&self, url: &str) -> Result<Page<Character>> {
        self.record(url)?;
        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::network("Failed to fetch: HTTP error! status: 404"))
    }

    async fn fetch_resource(&self, url: &str) -> Result<serde_json::Value> {
        self.record(url)?;
        self.resources
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::network("Failed to fetch: HTTP error! status: 404"))
    }
}
