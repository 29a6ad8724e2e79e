//! Session-wide cache of the complete character collection.
//!
//! Populated at most once by walking every page of the remote collection.
//! A failed walk is logged and leaves the cache empty: search and filters
//! are an enhancement over the paginated view, so the failure never blocks
//! it. There is no refresh path; a new session is the only reset.

use serde::Serialize;

use crate::models::Character;
use crate::source::ResourceSource;

/// Outcome of a [`FullCollection::populate`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The walk succeeded with this many characters.
    Loaded { count: usize },
    /// The walk failed; the cache stays empty.
    Failed { message: String },
    /// A previous call already ran the walk.
    AlreadyLoaded,
}

/// The full, unpaginated collection, read-only once populated.
#[derive(Debug, Clone, Default)]
pub struct FullCollection {
    characters: Vec<Character>,
    attempted: bool,
    failure: Option<String>,
}

impl FullCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an already-populated cache.
    pub fn from_characters(characters: Vec<Character>) -> Self {
        Self {
            characters,
            attempted: true,
            failure: None,
        }
    }

    /// Run the full walk against `source` unless it already ran.
    pub async fn populate<S: ResourceSource + ?Sized>(&mut self, source: &S) -> LoadOutcome {
        if self.attempted {
            return LoadOutcome::AlreadyLoaded;
        }
        let outcome = Self::load(source).await;
        self.apply(outcome)
    }

    /// Fetch the walk without touching any cache.
    ///
    /// Lets a caller run the network walk outside of a lock and hand the
    /// result to [`apply`](Self::apply) afterwards.
    pub async fn load<S: ResourceSource + ?Sized>(
        source: &S,
    ) -> crate::Result<Vec<Character>> {
        source.fetch_all_characters().await
    }

    /// Store the result of a walk. Only the first call has any effect.
    pub fn apply(&mut self, result: crate::Result<Vec<Character>>) -> LoadOutcome {
        if self.attempted {
            return LoadOutcome::AlreadyLoaded;
        }
        self.attempted = true;
        match result {
            Ok(characters) => {
                let count = characters.len();
                tracing::info!(count, "full collection loaded");
                self.characters = characters;
                LoadOutcome::Loaded { count }
            }
            Err(e) => {
                tracing::warn!(error = %e, "error loading all characters for filters");
                let message = e.to_string();
                self.failure = Some(message.clone());
                LoadOutcome::Failed { message }
            }
        }
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether a walk has been attempted (successfully or not).
    pub fn is_attempted(&self) -> bool {
        self.attempted
    }

    /// Error message of a failed walk.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::InMemorySource;

    const ROOT: &str = "mem://api/people/";

    fn named(name: &str) -> Character {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "url": format!("mem://api/people/{}/", name),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_populate_once() {
        let source = InMemorySource::with_characters(ROOT, vec![named("a"), named("b")]);
        let mut cache = FullCollection::new();

        assert_eq!(cache.populate(&source).await, LoadOutcome::Loaded { count: 2 });
        assert_eq!(cache.populate(&source).await, LoadOutcome::AlreadyLoaded);
        assert_eq!(source.request_count(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_walk_leaves_cache_empty() {
        let source = InMemorySource::with_characters(ROOT, vec![named("a")]);
        source.fail_url(ROOT);
        let mut cache = FullCollection::new();

        let outcome = cache.populate(&source).await;
        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        assert!(cache.is_empty());
        assert!(cache.is_attempted());
        assert!(cache.failure().is_some());

        // No retry path within a session
        source.heal_url(ROOT);
        assert_eq!(cache.populate(&source).await, LoadOutcome::AlreadyLoaded);
        assert!(cache.is_empty());
    }
}
