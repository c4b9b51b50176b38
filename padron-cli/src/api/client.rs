//! HTTP client for the console backend

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::models::{BatchCreateRequest, BatchCreateResponse, CatalogEntry, ExistingCredential};
use crate::import::validator::CandidateRecord;

/// Collaborator operations the import pipeline consumes
///
/// The pipeline only ever talks to the backend through this trait, so tests
/// run against an in-memory implementation.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    async fn list_institutions(&self) -> Result<Vec<CatalogEntry>>;
    async fn list_cities(&self) -> Result<Vec<CatalogEntry>>;
    async fn list_existing_credentials(&self) -> Result<Vec<ExistingCredential>>;
    async fn batch_create_authorities(
        &self,
        records: &[CandidateRecord],
    ) -> Result<BatchCreateResponse>;
}

/// reqwest-backed client with bearer authentication
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl ConsoleClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Console API returned {} for {}: {}", status, url, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode response from {}", url))
    }
}

#[async_trait]
impl ConsoleApi for ConsoleClient {
    async fn list_institutions(&self) -> Result<Vec<CatalogEntry>> {
        self.get_json("/api/institutions").await
    }

    async fn list_cities(&self) -> Result<Vec<CatalogEntry>> {
        self.get_json("/api/cities").await
    }

    async fn list_existing_credentials(&self) -> Result<Vec<ExistingCredential>> {
        self.get_json("/api/authorities/credentials").await
    }

    async fn batch_create_authorities(
        &self,
        records: &[CandidateRecord],
    ) -> Result<BatchCreateResponse> {
        let url = self.url("/api/authorities/batch");
        log::info!("POST {} ({} records)", url, records.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&BatchCreateRequest { records })
            .send()
            .await
            .with_context(|| format!("Batch create request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Batch create returned {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to decode batch create response")
    }
}
