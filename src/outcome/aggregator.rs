use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{BetOutcome, BetOutcomeRecord, Summary};
use crate::common::errors::{Result, WorkbenchError};
use crate::engine::messages::EvaluationRecord;

/// Validate every wire record, failing on the first malformed one.
///
/// No partial list is ever returned, so statistics built from the result
/// cover the whole run.
pub fn validate_outcomes(records: &[BetOutcomeRecord]) -> Result<Vec<BetOutcome>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| BetOutcome::from_record(index, record))
        .collect()
}

/// Lazy `(outcome, cumulative profit)` sequence in input order.
///
/// Once the cumulative profit overflows, that item and every later one is an
/// [`WorkbenchError::Overflow`].
#[derive(Debug, Clone)]
pub struct RunningPnl<'a> {
    outcomes: std::slice::Iter<'a, BetOutcome>,
    cumulative: Option<Decimal>,
}

impl<'a> Iterator for RunningPnl<'a> {
    type Item = Result<(&'a BetOutcome, Decimal)>;

    fn next(&mut self) -> Option<Self::Item> {
        let outcome = self.outcomes.next()?;
        self.cumulative = self
            .cumulative
            .and_then(|sum| sum.checked_add(outcome.profit));
        Some(
            self.cumulative
                .map(|sum| (outcome, sum))
                .ok_or(WorkbenchError::Overflow("running_pnl")),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.outcomes.size_hint()
    }
}

impl ExactSizeIterator for RunningPnl<'_> {}

/// Prefix sums of profit, aligned with the order outcomes were supplied
pub fn running_pnl(outcomes: &[BetOutcome]) -> RunningPnl<'_> {
    RunningPnl {
        outcomes: outcomes.iter(),
        cumulative: Some(Decimal::ZERO),
    }
}

fn add(sum: Decimal, value: Decimal, field: &'static str) -> Result<Decimal> {
    sum.checked_add(value).ok_or(WorkbenchError::Overflow(field))
}

/// Summary statistics over the full outcome list.
///
/// Figures that overflow `Decimal` fail the whole summary.
pub fn summarize(outcomes: &[BetOutcome]) -> Result<Summary> {
    let mut total_pnl = Decimal::ZERO;
    let mut total_stake = Decimal::ZERO;
    let mut total_liability = Decimal::ZERO;
    let mut win_sum = Decimal::ZERO;
    let mut loss_sum = Decimal::ZERO;
    let mut win_count = 0usize;
    let mut loss_count = 0usize;

    for outcome in outcomes {
        total_pnl = add(total_pnl, outcome.profit, "total_pnl")?;
        total_stake = add(total_stake, outcome.stake, "total_stake")?;
        total_liability = add(total_liability, outcome.liability, "total_liability")?;
        if outcome.is_win() {
            win_count += 1;
            win_sum = add(win_sum, outcome.profit, "avg_win")?;
        } else if outcome.is_loss() {
            loss_count += 1;
            loss_sum = add(loss_sum, outcome.profit, "avg_loss")?;
        }
    }

    let decided = win_count + loss_count;
    let win_rate = if decided > 0 {
        win_count as f64 / decided as f64
    } else {
        0.0
    };

    let roi_percent = if total_stake > Decimal::ZERO {
        total_pnl
            .checked_div(total_stake)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(WorkbenchError::Overflow("roi_percent"))?
    } else {
        Decimal::ZERO
    };

    Ok(Summary {
        total_pnl,
        win_count,
        loss_count,
        void_count: outcomes.len() - decided,
        win_rate,
        roi_percent,
        total_stake,
        total_liability,
        avg_win: mean(win_sum, win_count),
        avg_loss: mean(loss_sum, loss_count),
    })
}

// A mean never exceeds its largest term, so the division cannot overflow.
fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count)
    }
}

/// Outcome joined with its market's venue and name, plus running P&L
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub outcome: BetOutcome,
    pub venue: String,
    pub market_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub running_pnl: Decimal,
}

/// Attach market metadata to each outcome by `market_id`.
///
/// Outcomes whose market has no evaluation record get an empty venue and name.
pub fn join_with_evaluations(
    outcomes: &[BetOutcome],
    evaluations: &[EvaluationRecord],
) -> Result<Vec<OutcomeRow>> {
    let by_market: HashMap<&str, &EvaluationRecord> = evaluations
        .iter()
        .map(|e| (e.market_id.as_str(), e))
        .collect();

    running_pnl(outcomes)
        .map(|step| {
            let (outcome, cumulative) = step?;
            let market = by_market.get(outcome.market_id.as_str());
            Ok(OutcomeRow {
                outcome: outcome.clone(),
                venue: market.map(|m| m.venue.clone()).unwrap_or_default(),
                market_name: market.map(|m| m.market_name.clone()).unwrap_or_default(),
                running_pnl: cumulative,
            })
        })
        .collect()
}
