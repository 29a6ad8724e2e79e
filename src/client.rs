//! HTTP client for the reference API.
//!
//! [`SwapiClient`] implements the core [`ResourceSource`] trait over
//! `reqwest`. It is stateless apart from the connection pool: no response
//! caching happens here, callers own their caches.
//!
//! # Errors
//!
//! Every failure is a [`Error::Network`]:
//! - non-2xx status → `Failed to fetch: HTTP error! status: 404 Not Found`
//! - transport failure or timeout → `Failed to fetch: <cause>`
//! - body that is not valid JSON → `Failed to fetch: <parse error>`

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use swapi_explorer_core::error::Error;
use swapi_explorer_core::models::{Character, Page};
use swapi_explorer_core::source::ResourceSource;

use crate::config::Config;

/// `reqwest`-backed remote data client.
#[derive(Debug, Clone)]
pub struct SwapiClient {
    http: reqwest::Client,
    root: String,
}

impl SwapiClient {
    /// Build a client for the API configured in `[api]`.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(concat!("swx/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            root: config.people_root(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        tracing::debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to fetch: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "Failed to fetch: HTTP error! status: {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::network(format!("Failed to fetch: {}", e)))?;
        serde_json::from_slice(&body).map_err(Error::parse)
    }
}

#[async_trait]
impl ResourceSource for SwapiClient {
    fn root(&self) -> &str {
        &self.root
    }

    async fn fetch_page_url(&self, url: &str) -> Result<Page<Character>, Error> {
        self.get_json(url).await
    }

    async fn fetch_resource(&self, url: &str) -> Result<serde_json::Value, Error> {
        self.get_json(url).await
    }
}
