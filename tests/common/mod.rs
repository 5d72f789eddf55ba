//! Common test utilities and fixtures
#![allow(dead_code)]

use backtest_workbench::common::types::{MarketSnapshot, RunnerSnapshot};
use backtest_workbench::{default_strategy, LocalSimulator, Strategy};
use once_cell::sync::Lazy;

pub const DATE: &str = "2024-03-09";

/// Default strategy, built once per test binary
pub static DEFAULT_STRATEGY: Lazy<Strategy> = Lazy::new(default_strategy);

/// A GB win market at `venue` with runners given as `(selection_id, name, lay, back)`
pub fn sample_market(
    market_id: &str,
    venue: &str,
    start: &str,
    runners: &[(u64, &str, f64, f64)],
) -> MarketSnapshot {
    MarketSnapshot {
        market_id: market_id.to_string(),
        market_name: "2m4f Hcap Chs".to_string(),
        venue: venue.to_string(),
        market_start_time: start.to_string(),
        event_name: format!("{} 9th Mar", venue),
        event_country: "GB".to_string(),
        status: "OPEN".to_string(),
        inplay: false,
        recorded_at: "2024-03-09T12:00:00Z".to_string(),
        number_of_winners: 1,
        total_matched: 25_000.0,
        runners: runners
            .iter()
            .map(|(id, name, lay, back)| RunnerSnapshot::active(*id, *name, *lay).with_back(*back))
            .collect(),
    }
}

/// Copy of `market` after the off, with `winner` settled as WINNER and the
/// remaining runners as LOSER
pub fn settled(market: &MarketSnapshot, winner: u64) -> MarketSnapshot {
    let mut closed = market.clone();
    closed.status = "CLOSED".to_string();
    for runner in &mut closed.runners {
        runner.status = if runner.selection_id == winner {
            "WINNER".to_string()
        } else {
            "LOSER".to_string()
        };
    }
    closed
}

/// Simulator holding one day with three markets:
/// - 1.100 at Ascot: short favourite (1.8) that loses
/// - 1.200 at Kempton: 3.0 favourite that wins
/// - 1.300 at Ascot: 6.0 favourite with a tight second, second favourite wins
pub fn sample_simulator() -> LocalSimulator {
    let ascot_1 = sample_market(
        "1.100",
        "Ascot",
        "2024-03-09T13:30:00.000Z",
        &[(1, "Hot Pot", 1.8, 1.76), (2, "Slow Boat", 5.0, 4.8), (3, "Outsider", 21.0, 19.0)],
    );
    let kempton = sample_market(
        "1.200",
        "Kempton",
        "2024-03-09T14:05:00.000Z",
        &[(4, "Steady", 3.0, 2.94), (5, "Chaser", 4.5, 4.3)],
    );
    let ascot_2 = sample_market(
        "1.300",
        "Ascot",
        "2024-03-09T15:15:00.000Z",
        &[(6, "Open Race", 6.0, 5.8), (7, "Close Second", 7.0, 6.8), (8, "Longshot", 15.0, 14.0)],
    );

    let snapshots = vec![
        ascot_1.clone(),
        kempton.clone(),
        ascot_2.clone(),
        settled(&ascot_1, 2),
        settled(&kempton, 4),
        settled(&ascot_2, 7),
    ];

    let mut simulator = LocalSimulator::new();
    simulator
        .insert_snapshots(DATE, snapshots)
        .expect("valid date");
    simulator
}

/// Sample engine payloads
pub mod payloads {
    /// Simulation response with outcomes of +5, -3, +5
    pub const SIMULATION_RESPONSE: &str = r#"{
        "date": "2024-03-09",
        "strategy_name": "Default - UK/IE Favourite Lay",
        "markets_evaluated": 3,
        "markets_with_bets": 2,
        "bets_placed": 3,
        "bet_outcomes": [
            {"market_id": "1.1", "selection_id": 11, "runner_name": "Alpha", "bet_type": "LAY",
             "price": 1.5, "stake": 5.0, "liability": 2.5, "rule_id": "RULE_1",
             "rule_name": "Strong favourite", "runner_result": "LOSER", "profit": 5.0},
            {"market_id": "1.2", "selection_id": 21, "runner_name": "Bravo", "bet_type": "LAY",
             "price": 2.5, "stake": 2.0, "liability": 3.0, "rule_id": "RULE_2",
             "rule_name": "Mid-range favourite", "runner_result": "WINNER", "profit": -3.0},
            {"market_id": "1.2", "selection_id": 22, "runner_name": "Charlie", "bet_type": "LAY",
             "price": 3.0, "stake": 5.0, "liability": 10.0, "rule_id": "RULE_2",
             "rule_name": "Mid-range favourite", "runner_result": "LOSER", "profit": 5.0}
        ],
        "evaluations": [
            {"market_id": "1.1", "market_name": "2m Nov Hrd", "venue": "Cheltenham",
             "market_start_time": "2024-03-09T13:30:00.000Z", "skipped": false},
            {"market_id": "1.2", "market_name": "1m Hcap", "venue": "Lingfield",
             "market_start_time": "2024-03-09T14:00:00.000Z", "skipped": false},
            {"market_id": "1.3", "market_name": "6f Mdn", "venue": "Wolverhampton",
             "skipped": true, "skip_reason": "No rules matched"}
        ],
        "summary": {
            "total_pnl": 7.0, "win_count": 2, "loss_count": 1, "void_count": 0,
            "total_stake": 12.0, "total_liability": 15.5, "roi_percent": 45.16,
            "avg_win": 5.0, "avg_loss": -3.0
        }
    }"#;

    pub const DATES: &str = r#"{"dates": ["2024-03-08", "2024-03-09"]}"#;

    pub const MARKETS: &str = r#"{
        "date": "2024-03-09",
        "venues": [{
            "venue": "Cheltenham",
            "markets": [{
                "market_id": "1.1",
                "market_name": "2m Nov Hrd",
                "market_start_time": "2024-03-09T13:30:00.000Z",
                "venue": "Cheltenham",
                "event_name": "Chelt 9th Mar",
                "runner_count": 8,
                "total_matched": 120000.5,
                "runners": [
                    {"selection_id": 11, "runner_name": "Alpha", "best_lay_odds": 1.5,
                     "best_back_odds": 1.48, "status": "ACTIVE"}
                ]
            }]
        }],
        "total_markets": 1
    }"#;
}
