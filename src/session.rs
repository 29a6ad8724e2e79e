//! Session persistence and the background refresh task.
//!
//! The token lives in a small JSON file (the local "storage") under the
//! fixed key [`TOKEN_KEY`]. [`SessionManager`] owns the session context:
//! it is created on login, restored on startup, and invalidated on logout.
//! While a session is active, an optional [`RefreshTask`] polls at least
//! every five minutes and silently reissues an expired token.
//!
//! None of this is authentication. See `swapi_explorer_core::session`.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use swapi_explorer_core::error::Error;
use swapi_explorer_core::session::{Session, MIN_REFRESH_INTERVAL_SECS};

use crate::config::Config;

/// Storage key of the persisted token.
pub const TOKEN_KEY: &str = "swapi_token";

/// Session context shared between the manager and its refresh task.
pub type SharedSession = Arc<RwLock<Option<Session>>>;

/// File-backed key/value storage for the token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session store: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session store: {}", self.path.display()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("Failed to write session store: {}", self.path.display()))
    }

    pub fn load(&self) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(TOKEN_KEY))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_map(&map)
    }

    /// Remove the token. Returns `true` if one was stored.
    pub fn clear(&self) -> Result<bool> {
        let mut map = self.read_map().unwrap_or_default();
        let removed = map.remove(TOKEN_KEY).is_some();
        self.write_map(&map)?;
        Ok(removed)
    }
}

/// Owns the current session and its refresh task.
pub struct SessionManager {
    store: TokenStore,
    current: SharedSession,
    refresh: Mutex<Option<RefreshTask>>,
    interval: Duration,
}

impl SessionManager {
    pub fn new(config: &Config) -> Self {
        Self::with_store(
            TokenStore::new(&config.session.store_path),
            Duration::from_secs(config.session.refresh_interval_secs),
        )
    }

    /// `interval` is raised to the five-minute minimum.
    pub fn with_store(store: TokenStore, interval: Duration) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(None)),
            refresh: Mutex::new(None),
            interval: interval.max(Duration::from_secs(MIN_REFRESH_INTERVAL_SECS)),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Accept any non-empty credentials, persist the token, and make the
    /// session current.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let session = Session::login(username, password, Utc::now())?;
        self.store.save(session.token())?;
        self.set_current(Some(session.clone()));
        tracing::info!(username = session.username(), "logged in");
        Ok(session)
    }

    /// Load the stored token, if any.
    ///
    /// An expired token is reissued for the same user and saved back. An
    /// undecodable token is discarded.
    pub fn restore(&self) -> Result<Option<Session>> {
        let Some(token) = self.store.load()? else {
            return Ok(None);
        };
        match Session::restore(&token, Utc::now()) {
            Ok((session, reissued)) => {
                if reissued {
                    tracing::info!(username = session.username(), "reissued expired token");
                    self.store.save(session.token())?;
                }
                self.set_current(Some(session.clone()));
                Ok(Some(session))
            }
            Err(Error::InvalidToken) => {
                tracing::warn!(path = %self.store.path().display(), "discarding invalid token");
                self.store.clear()?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Restore the session or fail with a hint to log in.
    pub fn require(&self) -> Result<Session> {
        match self.current() {
            Some(s) => Ok(s),
            None => self
                .restore()?
                .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `swx login <username> <password>` first.")),
        }
    }

    /// Invalidate the session, clear storage, and stop the refresh task.
    pub fn logout(&self) -> Result<bool> {
        self.stop_refresh();
        self.set_current(None);
        let removed = self.store.clear()?;
        tracing::info!("logged out");
        Ok(removed)
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    pub fn shared(&self) -> SharedSession {
        self.current.clone()
    }

    /// Start the background liveness check (no-op if already running).
    pub fn start_refresh(&self) {
        if let Ok(mut slot) = self.refresh.lock() {
            if slot.is_none() {
                *slot = Some(RefreshTask::spawn(
                    self.current.clone(),
                    self.store.clone(),
                    self.interval,
                ));
            }
        }
    }

    pub fn stop_refresh(&self) {
        if let Ok(mut slot) = self.refresh.lock() {
            if let Some(task) = slot.take() {
                task.cancel();
            }
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.interval
    }

    fn set_current(&self, session: Option<Session>) {
        if let Ok(mut current) = self.current.write() {
            *current = session;
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_refresh();
    }
}

/// Scheduled task that reissues an expired token while a session is live.
pub struct RefreshTask {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Spawn on the current tokio runtime. Exits on cancel or once the
    /// session has been cleared.
    pub fn spawn(session: SharedSession, store: TokenStore, interval: Duration) -> Self {
        let (tx, mut rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = ticker.tick() => {
                        match refresh_once(&session, &store) {
                            Ok(Some(_)) | Ok(None) => {}
                            Err(e) => tracing::warn!(error = %e, "token refresh failed"),
                        }
                        let active = session.read().map(|s| s.is_some()).unwrap_or(false);
                        if !active {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("refresh task stopped");
        });
        Self {
            cancel: Some(tx),
            handle,
        }
    }

    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

/// One liveness check. Returns the new token when one was issued.
pub fn refresh_once(session: &SharedSession, store: &TokenStore) -> Result<Option<String>> {
    let token = {
        let mut guard = session
            .write()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        match guard.as_mut() {
            Some(s) => {
                if s.refresh_if_expired(Utc::now()) {
                    Some(s.token().to_string())
                } else {
                    None
                }
            }
            None => None,
        }
    };
    if let Some(token) = &token {
        store.save(token)?;
        tracing::debug!("session token reissued");
    }
    Ok(token)
}
