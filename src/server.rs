//! JSON HTTP shell.
//!
//! Serves the character browser over a small JSON API. The server holds a
//! single [`BrowserState`]; every mutating endpoint applies one user action
//! to it, runs the page fetch that action requires (if any), and responds
//! with the resulting [`BrowserView`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/state` | Current browser view |
//! | `POST` | `/page` | `{ "page": 3 }`, move to a page |
//! | `POST` | `/search` | `{ "query": "sky" }`, set the search text |
//! | `POST` | `/filters` | `{ "homeworld", "species", "film" }`, set the filters |
//! | `DELETE` | `/filters` | Clear all filters |
//! | `POST` | `/retry` | Re-fetch the current page after an error |
//! | `GET`  | `/character?url=` | Character detail with homeworld |
//! | `POST` | `/logout` | End the session; later calls get `401` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "page must be at least 1" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401),
//! `upstream_error` (502), `internal` (500).
//!
//! A failed page fetch is not an HTTP error: it shows up as `error` in the
//! returned view, and `POST /retry` re-issues the request.
//!
//! # Concurrency
//!
//! The browser lock is a plain mutex that is never held across an await.
//! Issuing a ticket and completing it are separate critical sections around
//! the network call, and stale completions are dropped by the state itself.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use swapi_explorer_core::browser::{BrowserState, BrowserView, Completion, PageTicket};
use swapi_explorer_core::collection::{FullCollection, LoadOutcome};
use swapi_explorer_core::detail::{load_detail, CharacterDetail};
use swapi_explorer_core::models::FilterSelection;
use swapi_explorer_core::options::derive_filter_options;
use swapi_explorer_core::source::ResourceSource;

use crate::client::SwapiClient;
use crate::config::Config;
use crate::session::SessionManager;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    browser: Arc<Mutex<BrowserState>>,
    source: Arc<dyn ResourceSource>,
    session: Arc<SessionManager>,
    concurrency: usize,
}

impl AppState {
    pub fn new(
        config: &Config,
        source: Arc<dyn ResourceSource>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            browser: Arc::new(Mutex::new(BrowserState::new())),
            source,
            session,
            concurrency: config.filters.max_concurrent_resolutions,
        }
    }

    fn browser(&self) -> MutexGuard<'_, BrowserState> {
        // BrowserState has no invariant a panicking handler could break
        // halfway, so a poisoned lock is still usable.
        self.browser.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn view(&self) -> BrowserView {
        self.browser().view()
    }

    /// Fetch the page named by `ticket` and hand the result back.
    async fn run_ticket(&self, ticket: PageTicket) {
        let result = self.source.fetch_page(ticket.page).await;
        let completion = self.browser().complete(ticket, result);
        match completion {
            Completion::Applied => tracing::debug!(page = ticket.page, "page applied"),
            Completion::Failed(message) => {
                tracing::debug!(page = ticket.page, %message, "page error shown")
            }
            Completion::Stale => {}
        }
    }

    async fn run_optional(&self, ticket: Option<PageTicket>) {
        if let Some(ticket) = ticket {
            self.run_ticket(ticket).await;
        }
    }

    fn authorize(&self) -> Result<(), AppError> {
        match self.session.current() {
            Some(_) => Ok(()),
            None => Err(unauthorized("Not logged in")),
        }
    }
}

/// Start the background loads: the first page, and the full-collection
/// walk followed by filter-option derivation.
///
/// The two run concurrently. A failed walk leaves filters unavailable and
/// search limited to the current page.
pub fn spawn_startup(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ticket = state.browser().request_page(1);
        tokio::join!(state.run_ticket(ticket), load_filters(&state));
    })
}

async fn load_filters(state: &AppState) {
    let walk = FullCollection::load(state.source.as_ref()).await;
    let outcome = state.browser().apply_full_collection(walk);
    if !matches!(outcome, LoadOutcome::Loaded { .. }) {
        return;
    }

    let characters = state.browser().full_collection().characters().to_vec();
    let options =
        derive_filter_options(state.source.as_ref(), &characters, state.concurrency).await;
    state.browser().set_filter_options(options);
    tracing::info!(characters = characters.len(), "filters ready");
}

/// Build the router. Exposed so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/state", get(handle_state))
        .route("/page", post(handle_page))
        .route("/search", post(handle_search))
        .route("/filters", post(handle_filters).delete(handle_clear_filters))
        .route("/retry", post(handle_retry))
        .route("/character", get(handle_character))
        .route("/logout", post(handle_logout))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP shell on `[server].bind`.
///
/// Requires a session (restoring it from the token store if needed) and
/// keeps it alive with the refresh task for as long as the server runs.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let session = Arc::new(SessionManager::new(config));
    let user = session.require()?;
    session.start_refresh();

    let source: Arc<dyn ResourceSource> = Arc::new(SwapiClient::new(config)?);
    let state = AppState::new(config, source, session.clone());
    spawn_startup(state.clone());

    let bind_addr = config.server.bind.clone();
    println!(
        "swx shell listening on http://{} (user: {})",
        bind_addr,
        user.username()
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await?;

    session.stop_refresh();
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

fn upstream_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Browser actions ============

async fn handle_state(State(state): State<AppState>) -> Result<Json<BrowserView>, AppError> {
    state.authorize()?;
    Ok(Json(state.view()))
}

#[derive(Deserialize)]
struct PageRequest {
    page: u64,
}

/// `POST /page`. Out-of-range pages are clamped; asking for the current
/// page is a no-op. Rejected while a search or filter is active.
async fn handle_page(
    State(state): State<AppState>,
    Json(req): Json<PageRequest>,
) -> Result<Json<BrowserView>, AppError> {
    state.authorize()?;
    if req.page == 0 {
        return Err(bad_request("page must be at least 1"));
    }
    if state.browser().is_narrowed() {
        return Err(bad_request(
            "page changes are unavailable while a search or filter is active",
        ));
    }
    let ticket = state.browser().change_page(req.page);
    state.run_optional(ticket).await;
    Ok(Json(state.view()))
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<BrowserView>, AppError> {
    state.authorize()?;
    let ticket = state.browser().set_query(req.query);
    state.run_optional(ticket).await;
    Ok(Json(state.view()))
}

#[derive(Deserialize)]
struct FiltersRequest {
    homeworld: Option<String>,
    species: Option<String>,
    film: Option<String>,
}

async fn handle_filters(
    State(state): State<AppState>,
    Json(req): Json<FiltersRequest>,
) -> Result<Json<BrowserView>, AppError> {
    state.authorize()?;
    let selection = FilterSelection::new(req.homeworld, req.species, req.film);
    let ticket = state.browser().set_selection(selection);
    state.run_optional(ticket).await;
    Ok(Json(state.view()))
}

async fn handle_clear_filters(
    State(state): State<AppState>,
) -> Result<Json<BrowserView>, AppError> {
    state.authorize()?;
    state.browser().clear_filters();
    Ok(Json(state.view()))
}

async fn handle_retry(State(state): State<AppState>) -> Result<Json<BrowserView>, AppError> {
    state.authorize()?;
    let ticket = state.browser().retry();
    state.run_ticket(ticket).await;
    Ok(Json(state.view()))
}

// ============ GET /character ============

#[derive(Deserialize)]
struct CharacterQuery {
    url: String,
}

async fn handle_character(
    State(state): State<AppState>,
    Query(q): Query<CharacterQuery>,
) -> Result<Json<CharacterDetail>, AppError> {
    state.authorize()?;
    if q.url.trim().is_empty() {
        return Err(bad_request("url must not be empty"));
    }
    let detail = load_detail(state.source.as_ref(), q.url.trim())
        .await
        .map_err(|e| upstream_error(e.to_string()))?;
    Ok(Json(detail))
}

// ============ POST /logout ============

#[derive(Serialize)]
struct LogoutResponse {
    logged_out: bool,
}

async fn handle_logout(State(state): State<AppState>) -> Result<Json<LogoutResponse>, AppError> {
    state.authorize()?;
    state
        .session
        .logout()
        .map_err(|e| internal_error(e.to_string()))?;
    Ok(Json(LogoutResponse { logged_out: true }))
}
