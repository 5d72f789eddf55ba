//! Market snapshot types and the market state the rule evaluator reads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::strategy::{FieldName, TargetRank};

fn default_runner_status() -> String {
    "ACTIVE".to_string()
}

fn default_number_of_winners() -> u32 {
    1
}

/// A runner at a point in time with prices and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSnapshot {
    pub selection_id: u64,
    pub runner_name: String,
    /// ACTIVE, WINNER, LOSER, REMOVED, ...
    #[serde(default = "default_runner_status")]
    pub status: String,
    #[serde(default)]
    pub best_available_to_lay: Option<f64>,
    #[serde(default)]
    pub best_available_to_back: Option<f64>,
    #[serde(default)]
    pub total_matched: f64,
}

impl RunnerSnapshot {
    /// Active runner with a lay price and no back price
    pub fn active(selection_id: u64, runner_name: impl Into<String>, lay: f64) -> Self {
        Self {
            selection_id,
            runner_name: runner_name.into(),
            status: default_runner_status(),
            best_available_to_lay: Some(lay),
            best_available_to_back: None,
            total_matched: 0.0,
        }
    }

    pub fn with_back(mut self, back: f64) -> Self {
        self.best_available_to_back = Some(back);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Active and priced to lay
    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE" && self.best_available_to_lay.is_some()
    }
}

/// A single market at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_id: String,
    #[serde(default)]
    pub market_name: String,
    #[serde(default)]
    pub venue: String,
    /// ISO-8601
    #[serde(default)]
    pub market_start_time: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_country: String,
    /// OPEN, SUSPENDED, CLOSED, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub inplay: bool,
    #[serde(default)]
    pub recorded_at: String,
    #[serde(default = "default_number_of_winners")]
    pub number_of_winners: u32,
    #[serde(default)]
    pub total_matched: f64,
    #[serde(default)]
    pub runners: Vec<RunnerSnapshot>,
}

impl Default for MarketSnapshot {
    fn default() -> Self {
        Self {
            market_id: String::new(),
            market_name: String::new(),
            venue: String::new(),
            market_start_time: String::new(),
            event_name: String::new(),
            event_country: String::new(),
            status: String::new(),
            inplay: false,
            recorded_at: String::new(),
            number_of_winners: default_number_of_winners(),
            total_matched: 0.0,
            runners: Vec::new(),
        }
    }
}

impl MarketSnapshot {
    pub fn active_runners(&self) -> impl Iterator<Item = &RunnerSnapshot> {
        self.runners.iter().filter(|r| r.is_active())
    }

    /// Open for betting and not yet in play
    pub fn is_pre_race(&self) -> bool {
        self.status == "OPEN" && !self.inplay
    }

    /// Carries at least one settled runner
    pub fn is_settled(&self) -> bool {
        self.runners
            .iter()
            .any(|r| r.status == "WINNER" || r.status == "LOSER")
    }
}

/// Runner as seen by rule evaluation, ordered by lay price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRunner {
    pub selection_id: u64,
    pub runner_name: String,
    pub lay_price: Option<f64>,
    pub back_price: Option<f64>,
    #[serde(default)]
    pub total_matched: f64,
}

impl From<&RunnerSnapshot> for RankedRunner {
    fn from(runner: &RunnerSnapshot) -> Self {
        Self {
            selection_id: runner.selection_id,
            runner_name: runner.runner_name.clone(),
            lay_price: runner.best_available_to_lay,
            back_price: runner.best_available_to_back,
            total_matched: runner.total_matched,
        }
    }
}

/// Field values of one market at evaluation time plus its odds-ranked runners
///
/// A field the market cannot supply (no second favourite, for instance) is
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    #[serde(default)]
    pub market_id: String,
    #[serde(default)]
    fields: HashMap<FieldName, f64>,
    /// Favourite first
    #[serde(default)]
    runners: Vec<RankedRunner>,
}

impl MarketState {
    pub fn new(market_id: impl Into<String>) -> Self {
        Self {
            market_id: market_id.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: FieldName, value: f64) -> Self {
        self.fields.insert(field, value);
        self
    }

    /// Append the next runner in rank order
    pub fn with_runner(mut self, runner: RankedRunner) -> Self {
        self.runners.push(runner);
        self
    }

    /// Derive the evaluation state from a snapshot.
    ///
    /// Active runners are ranked by ascending lay price, ties keeping their
    /// snapshot order.
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let mut active: Vec<&RunnerSnapshot> = snapshot.active_runners().collect();
        active.sort_by(|a, b| {
            let a = a.best_available_to_lay.unwrap_or(f64::INFINITY);
            let b = b.best_available_to_lay.unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        });

        let mut state = Self::new(snapshot.market_id.clone())
            .with_field(FieldName::RunnerCount, active.len() as f64)
            .with_field(FieldName::TotalMatched, snapshot.total_matched);

        let fav = active.first();
        let second = active.get(1);

        if let Some(fav) = fav {
            state.set(FieldName::FavLayOdds, fav.best_available_to_lay);
            state.set(FieldName::FavBackOdds, fav.best_available_to_back);
            state.set(FieldName::FavTotalMatched, Some(fav.total_matched));
        }
        if let Some(second) = second {
            state.set(FieldName::SecondFavLayOdds, second.best_available_to_lay);
            state.set(FieldName::SecondFavBackOdds, second.best_available_to_back);
        }
        if let (Some(fav), Some(second)) = (fav, second) {
            if let (Some(f), Some(s)) = (fav.best_available_to_lay, second.best_available_to_lay) {
                state.set(FieldName::GapToSecond, Some(s - f));
            }
        }

        state.runners = active.into_iter().map(RankedRunner::from).collect();
        state
    }

    fn set(&mut self, field: FieldName, value: Option<f64>) {
        if let Some(v) = value {
            self.fields.insert(field, v);
        }
    }

    pub fn get(&self, field: FieldName) -> Option<f64> {
        self.fields.get(&field).copied()
    }

    pub fn runners(&self) -> &[RankedRunner] {
        &self.runners
    }

    /// Runner occupying the given odds rank, if the market has that many
    pub fn resolve_target(&self, target: TargetRank) -> Option<&RankedRunner> {
        self.runners.get(target.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            market_id: "1.234".to_string(),
            status: "OPEN".to_string(),
            total_matched: 15_000.0,
            runners: vec![
                RunnerSnapshot::active(11, "Slow Boat", 8.0).with_back(7.6),
                RunnerSnapshot::active(12, "Hot Pot", 2.5).with_back(2.44),
                RunnerSnapshot::active(13, "Non Runner", 3.0).with_status("REMOVED"),
                RunnerSnapshot::active(14, "Steady", 4.0).with_back(3.9),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_from_snapshot_ranks_by_lay_price() {
        let state = MarketState::from_snapshot(&snapshot());
        let names: Vec<&str> = state.runners().iter().map(|r| r.runner_name.as_str()).collect();
        assert_eq!(names, vec!["Hot Pot", "Steady", "Slow Boat"]);

        assert_eq!(state.get(FieldName::FavLayOdds), Some(2.5));
        assert_eq!(state.get(FieldName::FavBackOdds), Some(2.44));
        assert_eq!(state.get(FieldName::SecondFavLayOdds), Some(4.0));
        assert_eq!(state.get(FieldName::GapToSecond), Some(1.5));
        assert_eq!(state.get(FieldName::RunnerCount), Some(3.0));
        assert_eq!(state.get(FieldName::TotalMatched), Some(15_000.0));
        assert_eq!(
            state.resolve_target(TargetRank::ThirdFavourite).map(|r| r.selection_id),
            Some(11)
        );
    }

    #[test]
    fn test_single_runner_market_lacks_second_fields() {
        let mut snap = snapshot();
        snap.runners.truncate(1);
        let state = MarketState::from_snapshot(&snap);

        assert_eq!(state.get(FieldName::FavLayOdds), Some(8.0));
        assert_eq!(state.get(FieldName::SecondFavLayOdds), None);
        assert_eq!(state.get(FieldName::GapToSecond), None);
        assert!(state.resolve_target(TargetRank::SecondFavourite).is_none());
    }

    #[test]
    fn test_snapshot_phase_helpers() {
        let mut snap = snapshot();
        assert!(snap.is_pre_race());
        assert!(!snap.is_settled());

        snap.inplay = true;
        assert!(!snap.is_pre_race());

        snap.runners[0].status = "WINNER".to_string();
        assert!(snap.is_settled());
    }
}
