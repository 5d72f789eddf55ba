//! Trait definitions for back-test engines

use async_trait::async_trait;

use super::errors::Result;
use crate::engine::messages::{MarketListing, SimulationRequest, SimulationResponse};
use crate::strategy::Strategy;

/// Trait for execution engines that replay a strategy over historical markets
///
/// This trait provides a unified interface for the remote engine behind the
/// REST API and for the in-process simulator.
#[async_trait]
pub trait BacktestEngine: Send + Sync {
    /// Snapshot dates the engine holds data for, ascending
    async fn list_dates(&self) -> Result<Vec<String>>;

    /// Markets available on a date, grouped by venue
    ///
    /// # Arguments
    /// * `date` - Snapshot date, `YYYY-MM-DD`
    async fn list_markets(&self, date: &str) -> Result<MarketListing>;

    /// Run one back-test
    ///
    /// A single in-flight request per run; no retry or cancellation.
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse>;

    /// The starter strategy to use when none has been authored
    async fn default_strategy(&self) -> Result<Strategy>;

    /// Get the name of the engine
    fn engine_name(&self) -> &'static str;
}
