//! Backtest Workbench Library
//!
//! Declarative betting strategies for horse-racing exchange markets: rules
//! are authored as data, evaluated against a market's pre-race state, and
//! the resulting bets are settled and aggregated into back-test P&L.

pub mod common;
pub mod config;
pub mod engine;
pub mod outcome;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{Result, WorkbenchError};
pub use common::traits::BacktestEngine;
pub use common::types::{MarketSnapshot, MarketState, RankedRunner, RunnerSnapshot};
pub use config::types::AppConfig;
pub use engine::messages::{EvaluationRecord, SimulationRequest, SimulationResponse};
pub use engine::{BacktestRestClient, LocalSimulator, RunReport, Workbench};

// Outcome types
pub use outcome::{
    join_with_evaluations, running_pnl, summarize, validate_outcomes, BetOutcome,
    BetOutcomeRecord, OutcomeRow, RunnerResult, Summary,
};

// Strategy types
pub use strategy::{
    default_strategy, Action, BetType, Condition, FieldName, MarketFilter, OperatorKind, Rule,
    RuleEvaluator, Strategy, TargetRank, TriggeredAction,
};
