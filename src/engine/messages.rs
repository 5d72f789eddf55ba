//! Request and response shapes exchanged with a back-test engine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::errors::{Result, WorkbenchError};
use crate::outcome::{BetOutcomeRecord, Summary};
use crate::strategy::{BetType, Strategy};

/// Snapshot dates are plain calendar days
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| {
        WorkbenchError::Validation(format!("date '{}' is not YYYY-MM-DD: {}", date, e))
    })
}

// ============================================================================
// Simulation
// ============================================================================

/// Strategy plus the snapshot date (and optionally the markets) to replay it on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub date: String,
    pub strategy: Strategy,
    /// `None` or empty runs every market of the day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_ids: Option<Vec<String>>,
}

impl SimulationRequest {
    pub fn new(date: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            date: date.into(),
            strategy,
            market_ids: None,
        }
    }

    pub fn with_markets(mut self, market_ids: Vec<String>) -> Self {
        self.market_ids = Some(market_ids);
        self
    }

    pub fn validate(&self) -> Result<()> {
        parse_date(&self.date)?;
        self.strategy.validate()
    }

    /// Whether the request covers the given market
    pub fn selects(&self, market_id: &str) -> bool {
        match &self.market_ids {
            Some(ids) if !ids.is_empty() => ids.iter().any(|id| id == market_id),
            _ => true,
        }
    }
}

/// Result of one back-test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    #[serde(default)]
    pub date: String,
    pub strategy_name: String,
    #[serde(default)]
    pub markets_evaluated: usize,
    #[serde(default)]
    pub markets_with_bets: usize,
    #[serde(default)]
    pub bets_placed: usize,
    /// Execution/settlement order
    #[serde(default)]
    pub bet_outcomes: Vec<BetOutcomeRecord>,
    #[serde(default)]
    pub evaluations: Vec<EvaluationRecord>,
    /// As computed by the engine
    #[serde(default)]
    pub summary: Summary,
}

/// A bet the engine decided to place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetInstruction {
    pub market_id: String,
    pub selection_id: u64,
    pub runner_name: String,
    pub bet_type: BetType,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub liability: Decimal,
    pub rule_id: String,
    #[serde(default)]
    pub rule_name: String,
}

/// Runner identity shown next to an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSummary {
    pub name: String,
    pub odds: Option<f64>,
    pub selection_id: u64,
}

/// Per-market evaluation metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub market_id: String,
    #[serde(default)]
    pub market_name: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub market_start_time: String,
    #[serde(default)]
    pub instructions: Vec<BetInstruction>,
    #[serde(default)]
    pub matched_rule_id: Option<String>,
    #[serde(default)]
    pub matched_rule_name: Option<String>,
    #[serde(default)]
    pub favourite: Option<RunnerSummary>,
    #[serde(default)]
    pub second_favourite: Option<RunnerSummary>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub skip_reason: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_stake: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_liability: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Market listing
// ============================================================================

/// Markets available on a snapshot date, grouped by venue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub venues: Vec<VenueMarkets>,
    #[serde(default)]
    pub total_markets: usize,
    #[serde(default)]
    pub snapshot_count: usize,
}

impl MarketListing {
    pub fn markets(&self) -> impl Iterator<Item = &ListedMarket> {
        self.venues.iter().flat_map(|v| v.markets.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueMarkets {
    pub venue: String,
    #[serde(default)]
    pub markets: Vec<ListedMarket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedMarket {
    pub market_id: String,
    pub market_name: String,
    /// ISO-8601
    pub market_start_time: String,
    pub runner_count: usize,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub total_matched: f64,
    #[serde(default)]
    pub runners: Vec<ListedRunner>,
}

impl ListedMarket {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.market_start_time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedRunner {
    pub selection_id: u64,
    pub runner_name: String,
    #[serde(default)]
    pub best_lay_odds: Option<f64>,
    #[serde(default)]
    pub best_back_odds: Option<f64>,
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Misc REST responses
// ============================================================================

/// Response from GET /api/dates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatesResponse {
    #[serde(default)]
    pub dates: Vec<String>,
}

/// Response from GET /api/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
}
