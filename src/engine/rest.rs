//! REST API client for a remote back-test engine

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::messages::*;
use crate::common::errors::{Result, WorkbenchError};
use crate::common::traits::BacktestEngine;
use crate::config::types::EngineConfig;
use crate::strategy::Strategy;

/// REST API client for the back-test engine
#[derive(Debug, Clone)]
pub struct BacktestRestClient {
    /// HTTP client
    client: Client,
    /// Base URL of the engine, without trailing slash
    base_url: String,
}

impl BacktestRestClient {
    /// Create a new REST client
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            WorkbenchError::Configuration(format!("invalid engine URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkbenchError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::with_timeout(
            &config.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// Check engine health
    #[instrument(skip(self))]
    pub async fn get_health(&self) -> Result<HealthResponse> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    /// Dates with recorded snapshot data
    #[instrument(skip(self))]
    pub async fn get_dates(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/dates", self.base_url);
        debug!("Fetching dates from: {}", url);

        let response = self.client.get(&url).send().await?;
        let dates: DatesResponse = Self::read_json(response).await?;
        Ok(dates.dates)
    }

    /// Win markets for a date, grouped by venue
    #[instrument(skip(self))]
    pub async fn get_markets(&self, date: &str) -> Result<MarketListing> {
        parse_date(date)?;
        let url = format!("{}/api/markets/{}", self.base_url, date);
        debug!("Fetching markets from: {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    /// Submit a back-test run
    #[instrument(skip(self, request), fields(date = %request.date, strategy = %request.strategy.id))]
    pub async fn post_simulation(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        let url = format!("{}/api/simulate", self.base_url);
        debug!("Submitting simulation to: {}", url);

        let response = self.client.post(&url).json(request).send().await?;
        Self::read_json(response).await
    }

    /// The engine's well-known default strategy
    #[instrument(skip(self))]
    pub async fn get_default_strategy(&self) -> Result<Strategy> {
        let url = format!("{}/api/strategies/default", self.base_url);
        debug!("Fetching default strategy from: {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Map non-success statuses to a transport error and decode the body
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WorkbenchError::Transport {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Err(WorkbenchError::InvalidResponse(format!(
                "empty body with status {}",
                status
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl BacktestEngine for BacktestRestClient {
    async fn list_dates(&self) -> Result<Vec<String>> {
        self.get_dates().await
    }

    async fn list_markets(&self, date: &str) -> Result<MarketListing> {
        self.get_markets(date).await
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        self.post_simulation(request).await
    }

    async fn default_strategy(&self) -> Result<Strategy> {
        self.get_default_strategy().await
    }

    fn engine_name(&self) -> &'static str {
        "remote"
    }
}
