//! # swapi-explorer
//!
//! A browser for the character collection of the public Star Wars API.
//!
//! The domain logic (pagination, search, filtering, filter-option
//! derivation, the mock session token) lives in the runtime-agnostic
//! `swapi-explorer-core` crate. This crate adds the I/O around it: the
//! `reqwest` client, configuration, the persisted session, the `swx` CLI
//! runners, and a JSON HTTP shell.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────────┐
//! │  SWAPI over  │──▶│ swapi-explorer-core          │
//! │  HTTP/JSON   │   │ collection · options · engine│
//! └──────────────┘   │ pagination · browser · detail│
//!                    └──────────────┬───────────────┘
//!                        ┌──────────┴──────────┐
//!                        ▼                     ▼
//!                   ┌──────────┐         ┌──────────┐
//!                   │   CLI    │         │   HTTP   │
//!                   │  (swx)   │         │  shell   │
//!                   └──────────┘         └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | `reqwest` implementation of `ResourceSource` |
//! | [`session`] | Token persistence, session manager, refresh task |
//! | [`commands`] | `swx` subcommand runners |
//! | [`server`] | JSON HTTP shell |
//! | [`logging`] | `tracing` subscriber setup |

pub mod client;
pub mod commands;
pub mod config;
pub mod logging;
pub mod server;
pub mod session;
