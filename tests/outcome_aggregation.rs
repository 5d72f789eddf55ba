//! Integration tests for outcome validation, running P&L and summaries
//! computed from a full engine response.

mod common;

use backtest_workbench::{
    join_with_evaluations, running_pnl, summarize, validate_outcomes, BetOutcomeRecord,
    RunnerResult, SimulationResponse, WorkbenchError,
};
use common::payloads::SIMULATION_RESPONSE;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn response() -> SimulationResponse {
    serde_json::from_str(SIMULATION_RESPONSE).expect("fixture parses")
}

#[test]
fn test_running_pnl_example() {
    let outcomes = validate_outcomes(&response().bet_outcomes).unwrap();
    let running: Vec<Decimal> = running_pnl(&outcomes)
        .map(|step| step.unwrap().1)
        .collect();
    assert_eq!(running, vec![dec!(5), dec!(2), dec!(7)]);
}

#[test]
fn test_summary_example() {
    let outcomes = validate_outcomes(&response().bet_outcomes).unwrap();
    let summary = summarize(&outcomes).unwrap();

    assert_eq!(summary.total_pnl, dec!(7));
    assert_eq!(summary.win_count, 2);
    assert_eq!(summary.loss_count, 1);
    assert_eq!(summary.void_count, 0);
    assert_eq!(summary.avg_win, dec!(5));
    assert_eq!(summary.avg_loss, dec!(-3));
    assert_eq!(summary.total_stake, dec!(12));
    assert_eq!(summary.total_liability, dec!(15.5));
    assert!((summary.win_rate - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(summary.roi_percent.round_dp(2), dec!(58.33));
}

#[test]
fn test_engine_roi_on_liability_is_reported_as_mismatch() {
    let response = response();
    let outcomes = validate_outcomes(&response.bet_outcomes).unwrap();
    let summary = summarize(&outcomes).unwrap();

    assert_eq!(
        summary.mismatches(&response.summary, dec!(0.01)),
        vec!["roi_percent"]
    );
}

#[test]
fn test_join_attaches_venue_and_name() {
    let response = response();
    let outcomes = validate_outcomes(&response.bet_outcomes).unwrap();
    let rows = join_with_evaluations(&outcomes, &response.evaluations).unwrap();

    let venues: Vec<&str> = rows.iter().map(|r| r.venue.as_str()).collect();
    assert_eq!(venues, vec!["Cheltenham", "Lingfield", "Lingfield"]);
    assert_eq!(rows[1].market_name, "1m Hcap");
    assert_eq!(rows[2].running_pnl, dec!(7));
    assert_eq!(rows[1].outcome.runner_result, RunnerResult::Winner);
}

#[test]
fn test_join_missing_market_degrades_to_empty() {
    let response = response();
    let outcomes = validate_outcomes(&response.bet_outcomes).unwrap();
    let rows = join_with_evaluations(&outcomes, &[]).unwrap();

    assert!(rows.iter().all(|r| r.venue.is_empty() && r.market_name.is_empty()));
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_one_bad_record_fails_the_whole_list() {
    let mut response = response();
    response.bet_outcomes[1].liability = None;

    match validate_outcomes(&response.bet_outcomes) {
        Err(WorkbenchError::MalformedOutcome { index, field }) => {
            assert_eq!(index, 1);
            assert_eq!(field, "liability");
        }
        other => panic!("expected MalformedOutcome, got {:?}", other),
    }
}

#[test]
fn test_empty_outcomes() {
    let summary = summarize(&[]).unwrap();
    assert_eq!(summary.total_pnl, Decimal::ZERO);
    assert_eq!(summary.win_rate, 0.0);
    assert_eq!(summary.roi_percent, Decimal::ZERO);
    assert_eq!(running_pnl(&[]).len(), 0);
}

#[test]
fn test_void_bets_count_as_neither() {
    let json = r#"[
        {"market_id": "1.1", "stake": 2.0, "liability": 3.0, "profit": 0.0, "runner_result": "REMOVED"},
        {"market_id": "1.1", "stake": 2.0, "liability": 3.0, "profit": 2.0, "runner_result": "LOSER"}
    ]"#;
    let records: Vec<BetOutcomeRecord> = serde_json::from_str(json).unwrap();
    let outcomes = validate_outcomes(&records).unwrap();
    let summary = summarize(&outcomes).unwrap();

    assert_eq!(summary.win_count, 1);
    assert_eq!(summary.loss_count, 0);
    assert_eq!(summary.void_count, 1);
    assert_eq!(summary.win_rate, 1.0);
}

#[test]
fn test_extreme_figures_fail_instead_of_panicking() {
    let json = r#"[
        {"market_id": "1.1", "stake": 0.0000000001, "liability": 1.0, "profit": 1e20, "runner_result": "LOSER"}
    ]"#;
    let records: Vec<BetOutcomeRecord> = serde_json::from_str(json).unwrap();
    let outcomes = validate_outcomes(&records).unwrap();

    let err = summarize(&outcomes).unwrap_err();
    assert!(matches!(err, WorkbenchError::Overflow("roi_percent")));
    assert!(!err.is_transport());
}
