//! Browser state controller.
//!
//! Owns everything the presentation shell renders: the current page cache,
//! pagination, the search text, the filter selection, the full collection,
//! the derived filter options, and the loading/error flags.
//!
//! # Page requests
//!
//! Every page fetch is tagged with a [`PageTicket`] carrying a monotonically
//! increasing generation. Only the completion whose ticket matches the
//! latest issued generation is applied; anything older is dropped, so a
//! slow response for page 2 can never overwrite a newer page 3. The network
//! call itself happens outside this type, which keeps it free of locks
//! and runtimes:
//!
//! ```text
//! let ticket = state.request_page(3);        // under the caller's lock
//! let result = source.fetch_page(ticket.page).await;
//! state.complete(ticket, result);            // under the lock again
//! ```
//!
//! A failed fetch sets the error message and leaves the page cache as it
//! was; [`BrowserState::retry`] re-issues the same page.

use serde::Serialize;

use crate::collection::{FullCollection, LoadOutcome};
use crate::engine;
use crate::error::Result;
use crate::models::{Character, FilterOptions, FilterSelection, Page, SearchQuery};
use crate::pagination::{self, PageMarker, PaginationState};

/// Page numbers shown around the current page in the view.
pub const DEFAULT_WINDOW: u64 = 5;

/// Handle for one in-flight page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: u64,
}

/// What [`BrowserState::complete`] did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The page replaced the cache.
    Applied,
    /// The fetch failed; the error is now shown.
    Failed(String),
    /// A newer request was issued; the response was dropped.
    Stale,
}

/// Pagination as rendered: present only when controls are visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub current_page: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub window: Vec<PageMarker>,
}

/// Snapshot handed to the presentation shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserView {
    pub characters: Vec<Character>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: Option<PaginationView>,
    pub query: String,
    pub selection: FilterSelection,
    pub filter_options: FilterOptions,
    pub filters_loading: bool,
    /// `false` when the full collection is unavailable, in which case any
    /// search or filter only narrows the current page.
    pub filters_available: bool,
    pub using_full_collection: bool,
}

#[derive(Debug, Clone)]
pub struct BrowserState {
    page_characters: Vec<Character>,
    pagination: PaginationState,
    query: SearchQuery,
    selection: FilterSelection,
    full: FullCollection,
    options: FilterOptions,
    options_loading: bool,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserState {
    pub fn new() -> Self {
        Self {
            page_characters: Vec::new(),
            pagination: PaginationState::new(),
            query: SearchQuery::default(),
            selection: FilterSelection::default(),
            full: FullCollection::new(),
            options: FilterOptions::default(),
            options_loading: true,
            loading: true,
            error: None,
            generation: 0,
        }
    }

    /// Issue a request for `page` (1-based), superseding any in flight.
    pub fn request_page(&mut self, page: u64) -> PageTicket {
        self.generation += 1;
        self.pagination.current_page = page.max(1);
        self.loading = true;
        self.error = None;
        PageTicket {
            generation: self.generation,
            page: self.pagination.current_page,
        }
    }

    /// Move to `page` within the known range. `None` if nothing changes.
    ///
    /// Pagination is hidden while searching or filtering, so page changes
    /// are ignored until both are cleared.
    pub fn change_page(&mut self, page: u64) -> Option<PageTicket> {
        if self.is_narrowed() {
            tracing::debug!(page, "page change ignored while narrowed");
            return None;
        }
        if self.pagination.go_to(page) {
            Some(self.request_page(self.pagination.current_page))
        } else {
            None
        }
    }

    /// Re-issue the current page.
    pub fn retry(&mut self) -> PageTicket {
        self.request_page(self.pagination.current_page)
    }

    /// Apply the response for `ticket` if it is still the latest request.
    pub fn complete(&mut self, ticket: PageTicket, result: Result<Page<Character>>) -> Completion {
        if ticket.generation != self.generation {
            tracing::debug!(
                page = ticket.page,
                generation = ticket.generation,
                latest = self.generation,
                "dropping stale page response"
            );
            return Completion::Stale;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.pagination.set_count(page.count);
                self.page_characters = page.results;
                self.error = None;
                Completion::Applied
            }
            Err(e) => {
                tracing::warn!(page = ticket.page, error = %e, "page fetch failed");
                let message = e.to_string();
                self.error = Some(message.clone());
                Completion::Failed(message)
            }
        }
    }

    /// Update the search text. Returns a ticket when the page reset to 1.
    pub fn set_query(&mut self, text: impl Into<String>) -> Option<PageTicket> {
        self.query = SearchQuery::new(text);
        self.reset_if_narrowed()
    }

    /// Update the filter selection. Returns a ticket when the page reset to 1.
    pub fn set_selection(&mut self, selection: FilterSelection) -> Option<PageTicket> {
        self.selection = selection;
        self.reset_if_narrowed()
    }

    pub fn clear_filters(&mut self) {
        self.selection = FilterSelection::default();
    }

    /// Whether a search or filter is active.
    pub fn is_narrowed(&self) -> bool {
        engine::is_narrowed(&self.query, &self.selection)
    }

    fn reset_if_narrowed(&mut self) -> Option<PageTicket> {
        if self.is_narrowed() && self.pagination.reset() {
            Some(self.request_page(1))
        } else {
            None
        }
    }

    /// Store the full-collection walk result (first call only).
    pub fn apply_full_collection(&mut self, result: Result<Vec<Character>>) -> LoadOutcome {
        let outcome = self.full.apply(result);
        if self.full.is_empty() {
            self.options_loading = false;
        }
        outcome
    }

    pub fn set_filter_options(&mut self, options: FilterOptions) {
        self.options = options;
        self.options_loading = false;
    }

    /// The displayed list for the current inputs.
    pub fn displayed(&self) -> Vec<Character> {
        engine::display_list(
            &self.query,
            &self.selection,
            &self.page_characters,
            self.full.characters(),
        )
    }

    pub fn pagination_visible(&self) -> bool {
        !self.loading
            && self.error.is_none()
            && pagination::controls_visible(&self.query, &self.selection)
    }

    pub fn view(&self) -> BrowserView {
        let pagination = self.pagination_visible().then(|| PaginationView {
            current_page: self.pagination.current_page,
            total_pages: self.pagination.total_pages,
            has_previous: self.pagination.has_previous(),
            has_next: self.pagination.has_next(),
            window: self.pagination.window(DEFAULT_WINDOW),
        });

        BrowserView {
            characters: self.displayed(),
            loading: self.loading,
            error: self.error.clone(),
            pagination,
            query: self.query.as_str().to_string(),
            selection: self.selection.clone(),
            filter_options: self.options.clone(),
            filters_loading: self.options_loading,
            filters_available: !self.full.is_empty(),
            using_full_collection: engine::uses_full_collection(
                &self.query,
                &self.selection,
                self.full.characters(),
            ),
        }
    }

    pub fn page_characters(&self) -> &[Character] {
        &self.page_characters
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn full_collection(&self) -> &FullCollection {
        &self.full
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn named(name: &str, homeworld: &str) -> Character {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "homeworld": homeworld,
            "url": format!("mem://api/people/{}/", name),
        }))
        .unwrap()
    }

    fn page(names: &[&str], count: u64) -> Page<Character> {
        Page {
            count,
            next: None,
            previous: None,
            results: names.iter().map(|n| named(n, "h1")).collect(),
        }
    }

    fn names(list: &[Character]) -> Vec<&str> {
        list.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = BrowserState::new();
        let view = state.view();
        assert!(view.loading);
        assert!(view.characters.is_empty());
        assert!(view.pagination.is_none());
    }

    #[test]
    fn test_applies_latest_page() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        assert_eq!(state.complete(t, Ok(page(&["a", "b"], 82))), Completion::Applied);

        let view = state.view();
        assert!(!view.loading);
        assert_eq!(names(&view.characters), vec!["a", "b"]);
        let p = view.pagination.unwrap();
        assert_eq!(p.total_pages, 9);
        assert_eq!(p.current_page, 1);
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut state = BrowserState::new();
        let first = state.request_page(1);
        state.complete(first, Ok(page(&["p1"], 30)));

        let slow = state.change_page(2).unwrap();
        let fast = state.change_page(3).unwrap();
        assert_eq!(state.complete(fast, Ok(page(&["p3"], 30))), Completion::Applied);
        assert_eq!(state.complete(slow, Ok(page(&["p2"], 30))), Completion::Stale);

        assert_eq!(names(state.page_characters()), vec!["p3"]);
        assert_eq!(state.pagination().current_page, 3);
    }

    #[test]
    fn test_failure_then_retry() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        state.complete(t, Ok(page(&["a"], 20)));

        let t = state.change_page(2).unwrap();
        let outcome = state.complete(t, Err(Error::network("HTTP error! status: 503")));
        assert!(matches!(outcome, Completion::Failed(ref m) if m.contains("503")));
        // Cache untouched by the failure
        assert_eq!(names(state.page_characters()), vec!["a"]);
        assert!(state.view().pagination.is_none());
        assert!(state.error().is_some());

        let retry = state.retry();
        assert_eq!(retry.page, 2);
        assert!(state.error().is_none());
        assert_eq!(state.complete(retry, Ok(page(&["b"], 20))), Completion::Applied);
        let view = state.view();
        assert_eq!(view.error, None);
        assert_eq!(names(&view.characters), vec!["b"]);
    }

    #[test]
    fn test_narrowing_resets_to_first_page() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        state.complete(t, Ok(page(&["a"], 30)));
        let t = state.change_page(3).unwrap();
        state.complete(t, Ok(page(&["c"], 30)));

        let ticket = state.set_query("luke").expect("reset should refetch page 1");
        assert_eq!(ticket.page, 1);
        assert_eq!(state.pagination().current_page, 1);

        // Already on page 1: no new request
        assert!(state
            .set_selection(FilterSelection::new(Some("h1".into()), None, None))
            .is_none());
    }

    #[test]
    fn test_page_change_ignored_while_searching() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        state.complete(t, Ok(page(&["a"], 30)));
        assert!(state.set_query("luke").is_none());

        assert!(state.change_page(3).is_none());
        assert_eq!(state.pagination().current_page, 1);

        // Clearing the search lands back on page 1, not a page picked while hidden
        assert!(state.set_query("").is_none());
        assert_eq!(state.pagination().current_page, 1);
        assert!(state.change_page(3).is_some());
    }

    #[test]
    fn test_empty_search_does_not_reset() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        state.complete(t, Ok(page(&["a"], 30)));
        let t = state.change_page(2).unwrap();
        state.complete(t, Ok(page(&["b"], 30)));

        assert!(state.set_query("  ").is_none());
        assert_eq!(state.pagination().current_page, 2);
    }

    #[test]
    fn test_full_collection_hides_pagination() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        state.complete(t, Ok(page(&["a"], 30)));
        state.apply_full_collection(Ok(vec![
            named("a", "h1"),
            named("b", "h2"),
            named("c", "h1"),
        ]));

        state.set_selection(FilterSelection::new(Some("h1".into()), None, None));
        let view = state.view();
        assert!(view.using_full_collection);
        assert!(view.pagination.is_none());
        assert_eq!(names(&view.characters), vec!["a", "c"]);

        state.clear_filters();
        let view = state.view();
        assert!(!view.using_full_collection);
        assert!(view.pagination.is_some());
        assert_eq!(names(&view.characters), vec!["a"]);
    }

    #[test]
    fn test_failed_walk_marks_filters_unavailable() {
        let mut state = BrowserState::new();
        let t = state.request_page(1);
        state.complete(t, Ok(page(&["a", "b"], 2)));
        let outcome = state.apply_full_collection(Err(Error::network("boom")));
        assert!(matches!(outcome, LoadOutcome::Failed { .. }));

        state.set_query("a");
        let view = state.view();
        assert!(!view.filters_available);
        assert!(!view.filters_loading);
        assert!(!view.using_full_collection);
        assert_eq!(names(&view.characters), vec!["a"]);
    }
}
