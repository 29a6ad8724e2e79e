//! A local fake of the reference API, served by axum on an ephemeral port.
//!
//! 23 characters over three pages. Characters 1-3 are Luke, Leia and Han;
//! the rest are numbered troopers. Homeworlds cycle through Tatooine,
//! Alderaan and Corellia; even-numbered characters are Human; everyone is
//! in "A New Hope", every fifth character also in "The Empire Strikes Back".

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const TOTAL: u64 = 23;

#[derive(Clone)]
struct Fake {
    base: String,
    failing: Arc<AtomicBool>,
}

pub struct FakeSwapi {
    /// e.g. `http://127.0.0.1:40123/api`
    pub base_url: String,
    failing: Arc<AtomicBool>,
}

impl FakeSwapi {
    /// Serve the fake on its own thread and runtime, so both sync and
    /// async tests can use it.
    pub fn start() -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}/api", port);
        let failing = Arc::new(AtomicBool::new(false));

        let state = Fake {
            base: base_url.clone(),
            failing: failing.clone(),
        };
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app(state)).await.unwrap();
            });
        });

        Self { base_url, failing }
    }

    /// Make every people-page request answer 500 until switched back.
    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    pub fn person_url(&self, id: u64) -> String {
        format!("{}/people/{}/", self.base_url, id)
    }

    pub fn planet_url(&self, id: u64) -> String {
        format!("{}/planets/{}/", self.base_url, id)
    }
}

fn app(state: Fake) -> Router {
    Router::new()
        .route("/api/people/", get(people))
        .route("/api/people/{id}/", get(person))
        .route("/api/planets/{id}/", get(planet))
        .route("/api/species/{id}/", get(species))
        .route("/api/films/{id}/", get(film))
        .with_state(state)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response()
}

fn name_of(id: u64) -> String {
    match id {
        1 => "Luke Skywalker".to_string(),
        2 => "Leia Organa".to_string(),
        3 => "Han Solo".to_string(),
        n => format!("Trooper {}", n),
    }
}

fn character(base: &str, id: u64) -> Value {
    let species: Vec<String> = if id % 2 == 0 {
        vec![format!("{}/species/1/", base)]
    } else {
        vec![]
    };
    let mut films = vec![format!("{}/films/1/", base)];
    if id % 5 == 0 {
        films.push(format!("{}/films/2/", base));
    }
    json!({
        "name": name_of(id),
        "height": if id == 1 { "172" } else { "unknown" },
        "mass": if id == 1 { "77" } else { "unknown" },
        "birth_year": if id == 1 { "19BBY" } else { "unknown" },
        "homeworld": format!("{}/planets/{}/", base, (id - 1) % 3 + 1),
        "species": species,
        "films": films,
        "created": "2014-12-09T13:50:51.644000Z",
        "url": format!("{}/people/{}/", base, id),
    })
}

#[derive(Deserialize)]
struct PageParams {
    page: Option<u64>,
}

async fn people(State(f): State<Fake>, Query(p): Query<PageParams>) -> Response {
    if f.failing.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    let pages = TOTAL.div_ceil(10);
    let page = p.page.unwrap_or(1);
    if page == 0 || page > pages {
        return not_found();
    }

    let first = (page - 1) * 10 + 1;
    let last = (page * 10).min(TOTAL);
    let results: Vec<Value> = (first..=last).map(|id| character(&f.base, id)).collect();
    let next = (page < pages).then(|| format!("{}/people/?page={}", f.base, page + 1));
    let previous = (page > 1).then(|| format!("{}/people/?page={}", f.base, page - 1));

    Json(json!({
        "count": TOTAL,
        "next": next,
        "previous": previous,
        "results": results,
    }))
    .into_response()
}

async fn person(State(f): State<Fake>, Path(id): Path<u64>) -> Response {
    if id == 0 || id > TOTAL {
        return not_found();
    }
    Json(character(&f.base, id)).into_response()
}

async fn planet(Path(id): Path<u64>) -> Response {
    let (name, terrain, climate, population) = match id {
        1 => ("Tatooine", "desert", "arid", "200000"),
        2 => ("Alderaan", "grasslands, mountains", "temperate", "2000000000"),
        3 => ("Corellia", "plains, urban, hills, forests", "temperate", "3000000000"),
        _ => return not_found(),
    };
    Json(json!({
        "name": name,
        "terrain": terrain,
        "climate": climate,
        "population": population,
    }))
    .into_response()
}

async fn species(Path(id): Path<u64>) -> Response {
    match id {
        1 => Json(json!({ "name": "Human" })).into_response(),
        _ => not_found(),
    }
}

async fn film(Path(id): Path<u64>) -> Response {
    match id {
        1 => Json(json!({ "title": "A New Hope", "episode_id": 4 })).into_response(),
        2 => Json(json!({ "title": "The Empire Strikes Back", "episode_id": 5 })).into_response(),
        _ => not_found(),
    }
}
