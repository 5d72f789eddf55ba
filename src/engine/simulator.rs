//! In-process back-test engine over recorded market snapshots
//!
//! Replays one day of snapshots per market: the last pre-race snapshot is
//! evaluated against the strategy, the last settled snapshot supplies runner
//! results, and every placed bet is settled and summarized.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::messages::*;
use crate::common::errors::{Result, WorkbenchError};
use crate::common::traits::BacktestEngine;
use crate::common::types::{MarketSnapshot, MarketState, RankedRunner};
use crate::outcome::settlement::{bet_profit, liability};
use crate::outcome::{summarize, BetOutcome, BetOutcomeRecord, RunnerResult};
use crate::strategy::{default_strategy, BetType, RuleEvaluator, Strategy};

/// Market name fragments of exotic (non-WIN) markets
const EXOTIC_PATTERNS: [&str; 9] = [
    "forecast",
    "reverse fc",
    "match bet",
    "without ",
    "to win by over",
    "to be placed",
    "each way",
    "daily win dist",
    "winning distances",
];

const NO_RULES_MATCHED: &str = "No rules matched";
const NO_RUNNER_AVAILABLE: &str = "No runner available for matched rule actions";

/// Whether a market is a main race WIN market rather than an exotic.
///
/// Checks the event name too, since some exotics carry the race name there.
pub fn is_main_race_market(market_name: &str, event_name: &str) -> bool {
    let combined = format!("{} {}", market_name, event_name).to_lowercase();
    !EXOTIC_PATTERNS.iter().any(|p| combined.contains(p))
}

/// Back-test engine running in-process over snapshots held in memory
#[derive(Debug, Clone, Default)]
pub struct LocalSimulator {
    /// Chronologically ordered snapshots, keyed by `YYYY-MM-DD`
    snapshots: BTreeMap<String, Vec<MarketSnapshot>>,
}

impl LocalSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append snapshots recorded on `date`, oldest first
    pub fn insert_snapshots(&mut self, date: &str, snapshots: Vec<MarketSnapshot>) -> Result<()> {
        parse_date(date)?;
        self.snapshots
            .entry(date.to_string())
            .or_default()
            .extend(snapshots);
        Ok(())
    }

    /// Append snapshots from newline-delimited JSON, one market per line
    pub fn load_ndjson(&mut self, date: &str, ndjson: &str) -> Result<usize> {
        let snapshots = ndjson
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str::<MarketSnapshot>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let count = snapshots.len();
        self.insert_snapshots(date, snapshots)?;
        debug!(date, count, "loaded snapshots");
        Ok(count)
    }

    pub fn snapshot_count(&self, date: &str) -> usize {
        self.snapshots.get(date).map_or(0, Vec::len)
    }

    fn day(&self, date: &str) -> &[MarketSnapshot] {
        self.snapshots.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run one back-test
    #[instrument(skip(self, request), fields(date = %request.date, strategy = %request.strategy.id))]
    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        request.validate()?;

        let mut outcomes: Vec<BetOutcome> = Vec::new();
        let mut evaluations = Vec::new();
        let mut markets_with_bets = 0;

        for (market_id, timeline) in group_timelines(self.day(&request.date)) {
            if !timeline.iter().any(|m| is_win_market(m)) || !request.selects(market_id) {
                continue;
            }

            let Some(pre_race) = timeline.iter().rev().find(|m| m.is_pre_race()) else {
                debug!(market_id, "no pre-race snapshot");
                continue;
            };

            let record = evaluate_market(&request.strategy, pre_race)?;
            if record.skipped || record.instructions.is_empty() {
                evaluations.push(record);
                continue;
            }

            markets_with_bets += 1;
            let results = runner_results(&timeline);
            for instruction in &record.instructions {
                let result = results
                    .get(&instruction.selection_id)
                    .copied()
                    .unwrap_or(RunnerResult::Unknown);
                outcomes.push(settle(instruction, result));
            }
            evaluations.push(record);
        }

        info!(
            markets = evaluations.len(),
            markets_with_bets,
            bets = outcomes.len(),
            "simulation complete"
        );

        Ok(SimulationResponse {
            date: request.date.clone(),
            strategy_name: request.strategy.name.clone(),
            markets_evaluated: evaluations.len(),
            markets_with_bets,
            bets_placed: outcomes.len(),
            summary: summarize(&outcomes)?,
            bet_outcomes: outcomes.iter().map(BetOutcomeRecord::from).collect(),
            evaluations,
        })
    }

    /// Markets of a date grouped by venue, each listed from its first snapshot
    pub fn markets(&self, date: &str) -> Result<MarketListing> {
        parse_date(date)?;
        let snapshots = self.day(date);

        let mut venues: BTreeMap<String, Vec<ListedMarket>> = BTreeMap::new();
        for (_, timeline) in group_timelines(snapshots) {
            let first = timeline[0];
            if !is_win_market(first) {
                continue;
            }
            let venue = if first.venue.is_empty() {
                "Unknown".to_string()
            } else {
                first.venue.clone()
            };
            venues
                .entry(venue.clone())
                .or_default()
                .push(listed_market(first, venue));
        }

        let venues: Vec<VenueMarkets> = venues
            .into_iter()
            .map(|(venue, mut markets)| {
                markets.sort_by(|a, b| a.market_start_time.cmp(&b.market_start_time));
                VenueMarkets { venue, markets }
            })
            .collect();

        Ok(MarketListing {
            date: date.to_string(),
            total_markets: venues.iter().map(|v| v.markets.len()).sum(),
            snapshot_count: snapshots.len(),
            venues,
        })
    }
}

#[async_trait]
impl BacktestEngine for LocalSimulator {
    async fn list_dates(&self) -> Result<Vec<String>> {
        Ok(self.snapshots.keys().cloned().collect())
    }

    async fn list_markets(&self, date: &str) -> Result<MarketListing> {
        self.markets(date)
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        self.run(request)
    }

    async fn default_strategy(&self) -> Result<Strategy> {
        Ok(default_strategy())
    }

    fn engine_name(&self) -> &'static str {
        "local"
    }
}

fn is_win_market(market: &MarketSnapshot) -> bool {
    market.number_of_winners == 1 && is_main_race_market(&market.market_name, &market.event_name)
}

/// Per-market timelines in first-seen order
fn group_timelines(snapshots: &[MarketSnapshot]) -> Vec<(&str, Vec<&MarketSnapshot>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut timelines: Vec<(&str, Vec<&MarketSnapshot>)> = Vec::new();

    for snapshot in snapshots {
        let id = snapshot.market_id.as_str();
        match index.get(id) {
            Some(&i) => timelines[i].1.push(snapshot),
            None => {
                index.insert(id, timelines.len());
                timelines.push((id, vec![snapshot]));
            }
        }
    }
    timelines
}

/// Runner results from the last snapshot carrying a settled runner
fn runner_results(timeline: &[&MarketSnapshot]) -> HashMap<u64, RunnerResult> {
    let Some(settled) = timeline.iter().rev().find(|m| m.is_settled()) else {
        return HashMap::new();
    };

    settled
        .runners
        .iter()
        .filter_map(|r| {
            let result = match r.status.as_str() {
                "WINNER" => RunnerResult::Winner,
                "LOSER" => RunnerResult::Loser,
                "REMOVED" => RunnerResult::Removed,
                _ => return None,
            };
            Some((r.selection_id, result))
        })
        .collect()
}

fn listed_market(market: &MarketSnapshot, venue: String) -> ListedMarket {
    ListedMarket {
        market_id: market.market_id.clone(),
        market_name: market.market_name.clone(),
        market_start_time: market.market_start_time.clone(),
        runner_count: market.active_runners().count(),
        venue,
        event_name: market.event_name.clone(),
        total_matched: market.total_matched,
        runners: market
            .runners
            .iter()
            .filter(|r| r.status == "ACTIVE")
            .map(|r| ListedRunner {
                selection_id: r.selection_id,
                runner_name: r.runner_name.clone(),
                best_lay_odds: r.best_available_to_lay,
                best_back_odds: r.best_available_to_back,
                status: r.status.clone(),
            })
            .collect(),
    }
}

fn runner_summary(runner: &RankedRunner) -> RunnerSummary {
    RunnerSummary {
        name: runner.runner_name.clone(),
        odds: runner.lay_price,
        selection_id: runner.selection_id,
    }
}

/// Evaluate a strategy against one pre-race snapshot
fn evaluate_market(strategy: &Strategy, market: &MarketSnapshot) -> Result<EvaluationRecord> {
    let state = MarketState::from_snapshot(market);
    let mut record = EvaluationRecord {
        market_id: market.market_id.clone(),
        market_name: market.market_name.clone(),
        venue: market.venue.clone(),
        market_start_time: market.market_start_time.clone(),
        favourite: state.runners().first().map(runner_summary),
        second_favourite: state.runners().get(1).map(runner_summary),
        ..Default::default()
    };

    if let Some(reason) = strategy
        .market_filters
        .as_ref()
        .and_then(|filters| filters.check(market))
    {
        debug!(market_id = %market.market_id, %reason, "market filtered out");
        record.skipped = true;
        record.skip_reason = reason;
        return Ok(record);
    }

    let evaluation = match RuleEvaluator::evaluate_detailed(strategy, &state) {
        Ok(evaluation) => evaluation,
        Err(e @ WorkbenchError::InvalidField { .. }) => {
            warn!(market_id = %market.market_id, error = %e, "market lacks a rule field");
            record.skipped = true;
            record.skip_reason = e.to_string();
            return Ok(record);
        }
        Err(e) => return Err(e),
    };

    for triggered in &evaluation.actions {
        let action = &triggered.action;
        let Some(runner) = state.resolve_target(action.target) else {
            continue;
        };
        let price = match action.bet_type {
            BetType::Lay => runner.lay_price,
            BetType::Back => runner.back_price,
        };
        let Some(price) = price.and_then(Decimal::from_f64) else {
            continue;
        };

        record.instructions.push(BetInstruction {
            market_id: market.market_id.clone(),
            selection_id: runner.selection_id,
            runner_name: runner.runner_name.clone(),
            bet_type: action.bet_type,
            price,
            stake: action.stake,
            liability: liability(action.bet_type, price, action.stake),
            rule_id: triggered.rule_id.clone(),
            rule_name: triggered.rule_name.clone(),
        });
    }

    if let Some(rule_id) = evaluation.last_match() {
        record.matched_rule_id = Some(rule_id.to_string());
        record.matched_rule_name = strategy.rule(rule_id).map(|r| r.name.clone());
    }

    if record.instructions.is_empty() {
        record.skipped = true;
        record.skip_reason = if evaluation.is_match() {
            NO_RUNNER_AVAILABLE
        } else {
            NO_RULES_MATCHED
        }
        .to_string();
    }

    record.total_stake = record.instructions.iter().map(|i| i.stake).sum();
    record.total_liability = record.instructions.iter().map(|i| i.liability).sum();
    Ok(record)
}

fn settle(instruction: &BetInstruction, result: RunnerResult) -> BetOutcome {
    BetOutcome {
        market_id: instruction.market_id.clone(),
        selection_id: Some(instruction.selection_id),
        runner_name: instruction.runner_name.clone(),
        rule_id: instruction.rule_id.clone(),
        rule_name: instruction.rule_name.clone(),
        bet_type: instruction.bet_type,
        price: Some(instruction.price),
        stake: instruction.stake,
        liability: instruction.liability,
        runner_result: result,
        profit: bet_profit(instruction.bet_type, instruction.price, instruction.stake, result),
    }
}
