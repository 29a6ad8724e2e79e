//! # swapi-explorer core
//!
//! Shared, WASM-safe logic for swapi-explorer: data models, the remote
//! source abstraction, the search/filter engine, pagination, the browser
//! state controller, and the mock session token.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or other
//! native-only dependencies. The HTTP client, session persistence, CLI
//! and HTTP shell live in the `swapi-explorer` application crate.

pub mod browser;
pub mod collection;
pub mod detail;
pub mod engine;
pub mod error;
pub mod models;
pub mod options;
pub mod pagination;
pub mod session;
pub mod source;

pub use error::{Error, Result};
