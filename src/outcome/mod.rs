//! Outcome module: bet settlement and back-test aggregation
//!
//! - [`validate_outcomes`]: wire records to checked [`BetOutcome`]s, all or nothing
//! - [`running_pnl`]: cumulative profit in settlement order
//! - [`summarize`]: totals, win/loss counts, ROI and averages
//! - [`join_with_evaluations`]: venue and market name for presentation
//! - [`settlement`]: liability and profit of a single bet

mod aggregator;
pub mod settlement;
mod types;

pub use aggregator::{
    join_with_evaluations, running_pnl, summarize, validate_outcomes, OutcomeRow, RunningPnl,
};

pub use types::{BetOutcome, BetOutcomeRecord, RunnerResult, Summary};
