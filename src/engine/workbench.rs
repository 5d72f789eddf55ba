//! Workbench session: submits back-test runs and derives the presented report

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument, warn};

use super::messages::{EvaluationRecord, MarketListing, SimulationRequest};
use crate::common::errors::Result;
use crate::common::traits::BacktestEngine;
use crate::outcome::{join_with_evaluations, summarize, validate_outcomes, OutcomeRow, Summary};
use crate::strategy::Strategy;

/// Largest tolerated gap between client and engine summary figures
pub const SUMMARY_TOLERANCE: Decimal = dec!(0.01);

/// Everything shown for one completed back-test run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub date: String,
    pub strategy_name: String,
    pub markets_evaluated: usize,
    pub markets_with_bets: usize,
    pub bets_placed: usize,
    /// Bets in settlement order with venue, market name and running P&L
    pub rows: Vec<OutcomeRow>,
    /// Derived client-side from `rows`
    pub summary: Summary,
    /// As reported by the engine
    pub engine_summary: Summary,
    pub evaluations: Vec<EvaluationRecord>,
}

impl RunReport {
    /// Final running P&L, equal to the summary total
    pub fn closing_pnl(&self) -> Decimal {
        self.rows
            .last()
            .map_or(Decimal::ZERO, |row| row.running_pnl)
    }

    /// Summary figures that disagree with the engine's own
    pub fn summary_mismatches(&self) -> Vec<&'static str> {
        self.summary.mismatches(&self.engine_summary, SUMMARY_TOLERANCE)
    }
}

/// Session over one back-test engine
///
/// Holds the last successful report; a failed run leaves it in place.
pub struct Workbench<E: BacktestEngine> {
    engine: E,
    last_report: Option<RunReport>,
}

impl<E: BacktestEngine> Workbench<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            last_report: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    pub async fn dates(&self) -> Result<Vec<String>> {
        self.engine.list_dates().await
    }

    pub async fn markets(&self, date: &str) -> Result<MarketListing> {
        self.engine.list_markets(date).await
    }

    pub async fn default_strategy(&self) -> Result<Strategy> {
        self.engine.default_strategy().await
    }

    /// Validate and submit one run, then rebuild its report client-side
    #[instrument(skip(self, request), fields(engine = self.engine.engine_name(), date = %request.date))]
    pub async fn run(&mut self, request: &SimulationRequest) -> Result<&RunReport> {
        request.validate()?;

        let response = self.engine.simulate(request).await?;
        let outcomes = validate_outcomes(&response.bet_outcomes)?;
        let summary = summarize(&outcomes)?;
        let rows = join_with_evaluations(&outcomes, &response.evaluations)?;

        let report = RunReport {
            date: response.date,
            strategy_name: response.strategy_name,
            markets_evaluated: response.markets_evaluated,
            markets_with_bets: response.markets_with_bets,
            bets_placed: response.bets_placed,
            rows,
            summary,
            engine_summary: response.summary,
            evaluations: response.evaluations,
        };

        let mismatches = report.summary_mismatches();
        if !mismatches.is_empty() {
            warn!(fields = ?mismatches, "engine summary disagrees with recomputed summary");
        }

        info!(
            bets = report.rows.len(),
            total_pnl = %report.summary.total_pnl,
            "run complete"
        );
        Ok(self.last_report.insert(report))
    }
}
