use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, WorkbenchError};
use crate::strategy::BetType;

/// Settled status of the runner a bet was placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunnerResult {
    Winner,
    Loser,
    Removed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Bet outcome as it arrives from an execution engine
///
/// Numeric fields stay optional here so that a missing value is reported
/// instead of read as zero. [`BetOutcome::from_record`] does the check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOutcomeRecord {
    #[serde(default)]
    pub market_id: String,
    #[serde(default)]
    pub selection_id: Option<u64>,
    #[serde(default)]
    pub runner_name: String,
    #[serde(default)]
    pub bet_type: BetType,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub stake: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub liability: Option<Decimal>,
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub rule_name: String,
    #[serde(default)]
    pub runner_result: RunnerResult,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub profit: Option<Decimal>,
}

/// Settled result of one executed action, with every figure present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOutcome {
    pub market_id: String,
    pub selection_id: Option<u64>,
    pub runner_name: String,
    pub rule_id: String,
    pub rule_name: String,
    pub bet_type: BetType,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub liability: Decimal,
    pub runner_result: RunnerResult,
    /// Positive when the bet won money, negative when it lost, zero for a void
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
}

impl BetOutcome {
    /// Check a wire record; `index` is its position in the outcome list
    pub fn from_record(index: usize, record: &BetOutcomeRecord) -> Result<Self> {
        let require = |value: Option<Decimal>, field: &'static str| {
            value.ok_or(WorkbenchError::MalformedOutcome { index, field })
        };

        Ok(Self {
            market_id: record.market_id.clone(),
            selection_id: record.selection_id,
            runner_name: record.runner_name.clone(),
            rule_id: record.rule_id.clone(),
            rule_name: record.rule_name.clone(),
            bet_type: record.bet_type,
            price: record.price,
            stake: require(record.stake, "stake")?,
            liability: require(record.liability, "liability")?,
            runner_result: record.runner_result,
            profit: require(record.profit, "profit")?,
        })
    }

    pub fn is_win(&self) -> bool {
        self.profit > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.profit < Decimal::ZERO
    }
}

impl From<&BetOutcome> for BetOutcomeRecord {
    fn from(outcome: &BetOutcome) -> Self {
        Self {
            market_id: outcome.market_id.clone(),
            selection_id: outcome.selection_id,
            runner_name: outcome.runner_name.clone(),
            bet_type: outcome.bet_type,
            price: outcome.price,
            stake: Some(outcome.stake),
            liability: Some(outcome.liability),
            rule_id: outcome.rule_id.clone(),
            rule_name: outcome.rule_name.clone(),
            runner_result: outcome.runner_result,
            profit: Some(outcome.profit),
        }
    }
}

/// Aggregate statistics of a back-test run
///
/// Always recomputed from the full outcome list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(default)]
    pub win_count: usize,
    #[serde(default)]
    pub loss_count: usize,
    #[serde(default)]
    pub void_count: usize,
    /// Fraction in `[0, 1]` of decided bets that won
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub roi_percent: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_stake: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_liability: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub avg_win: Decimal,
    /// Mean losing profit, negative
    #[serde(default, with = "rust_decimal::serde::float")]
    pub avg_loss: Decimal,
}

impl Summary {
    /// Names of the monetary figures and counts that differ from `other` by
    /// more than `tolerance`
    pub fn mismatches(&self, other: &Summary, tolerance: Decimal) -> Vec<&'static str> {
        let money = [
            ("total_pnl", self.total_pnl, other.total_pnl),
            ("roi_percent", self.roi_percent, other.roi_percent),
            ("total_stake", self.total_stake, other.total_stake),
            ("total_liability", self.total_liability, other.total_liability),
            ("avg_win", self.avg_win, other.avg_win),
            ("avg_loss", self.avg_loss, other.avg_loss),
        ];

        let mut fields: Vec<&'static str> = money
            .into_iter()
            .filter(|(_, a, b)| (*a - *b).abs() > tolerance)
            .map(|(name, _, _)| name)
            .collect();

        if self.win_count != other.win_count {
            fields.push("win_count");
        }
        if self.loss_count != other.loss_count {
            fields.push("loss_count");
        }
        fields
    }
}
