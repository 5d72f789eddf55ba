//! Integration tests for strategy authoring and rule evaluation
//!
//! These tests drive the public strategy API end to end: building and
//! importing strategies, deriving market state from snapshots, and
//! evaluating rules against it.

mod common;

use backtest_workbench::common::types::MarketState;
use backtest_workbench::strategy::default_strategy;
use backtest_workbench::{
    Action, BetType, Condition, FieldName, OperatorKind, Rule, RuleEvaluator, Strategy,
    TargetRank, WorkbenchError,
};
use common::{sample_market, DEFAULT_STRATEGY};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn state(fav_lay_odds: f64) -> MarketState {
    MarketState::new("1.1").with_field(FieldName::FavLayOdds, fav_lay_odds)
}

// ============================================================================
// Evaluation Tests
// ============================================================================

#[test]
fn test_single_rule_example() {
    let strategy = Strategy::new("s1", "Short favourites").with_rule(
        Rule::new("RULE_1", "Fav under 2", 1)
            .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Lt, 2.0))
            .with_action(Action::lay(TargetRank::Favourite, dec!(1.0))),
    );

    let actions = RuleEvaluator::evaluate(&strategy, &state(1.8)).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].rule_id, "RULE_1");
    assert_eq!(actions[0].action.target, TargetRank::Favourite);
    assert_eq!(actions[0].action.bet_type, BetType::Lay);
    assert_eq!(actions[0].action.stake, dec!(1.0));

    assert!(RuleEvaluator::evaluate(&strategy, &state(2.5))
        .unwrap()
        .is_empty());
}

#[test]
fn test_empty_strategy_emits_nothing() {
    let strategy = Strategy::new("empty", "Empty");
    assert!(RuleEvaluator::evaluate(&strategy, &state(1.5))
        .unwrap()
        .is_empty());
}

#[test]
fn test_rule_without_conditions_always_matches() {
    let strategy = Strategy::new("s", "Always").with_rule(
        Rule::new("ALWAYS", "Always", 1).with_action(Action::back(TargetRank::ThirdFavourite, dec!(0.5))),
    );
    let actions = RuleEvaluator::evaluate(&strategy, &MarketState::new("1.9")).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action.bet_type, BetType::Back);
}

#[test]
fn test_equal_priorities_keep_list_order() {
    let make = |id: &str| {
        Rule::new(id, id, 1)
            .with_stop_on_match(false)
            .with_action(Action::lay(TargetRank::Favourite, dec!(1)))
    };
    let strategy = Strategy::new("s", "s")
        .with_rule(make("zeta"))
        .with_rule(make("alpha"))
        .with_rule(make("mid"));

    let evaluation = RuleEvaluator::evaluate_detailed(&strategy, &state(3.0)).unwrap();
    assert_eq!(evaluation.evaluated_rules, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_priority_order_is_not_written_back() {
    let strategy = Strategy::new("s", "s")
        .with_rule(Rule::new("late", "late", 5))
        .with_rule(Rule::new("early", "early", 1));

    RuleEvaluator::evaluate(&strategy, &state(3.0)).unwrap();
    let stored: Vec<&str> = strategy.rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(stored, vec!["late", "early"]);
}

#[test]
fn test_actions_keep_stored_order_within_rule() {
    let strategy = Strategy::new("s", "s").with_rule(
        Rule::new("R", "R", 1)
            .with_action(Action::lay(TargetRank::SecondFavourite, dec!(2)))
            .with_action(Action::lay(TargetRank::Favourite, dec!(1))),
    );
    let targets: Vec<TargetRank> = RuleEvaluator::evaluate(&strategy, &state(3.0))
        .unwrap()
        .into_iter()
        .map(|t| t.action.target)
        .collect();
    assert_eq!(targets, vec![TargetRank::SecondFavourite, TargetRank::Favourite]);
}

// ============================================================================
// Default Strategy Against Snapshots
// ============================================================================

#[test]
fn test_default_strategy_bands() {
    let cases = [
        (1.8, 4.0, "RULE_1", 1),
        (2.0, 4.0, "RULE_2", 1),
        (5.0, 9.0, "RULE_2", 1),
        (6.0, 7.5, "RULE_3A", 2),
        (6.0, 8.0, "RULE_3B", 1),
    ];

    for (fav, second, expected_rule, expected_actions) in cases {
        let snapshot = sample_market(
            "1.1",
            "York",
            "2024-03-09T13:30:00.000Z",
            &[(1, "Fav", fav, fav - 0.1), (2, "Second", second, second - 0.1)],
        );
        let market = MarketState::from_snapshot(&snapshot);
        let actions = RuleEvaluator::evaluate(&DEFAULT_STRATEGY, &market).unwrap();

        assert_eq!(actions.len(), expected_actions, "fav {} second {}", fav, second);
        assert!(actions.iter().all(|a| a.rule_id == expected_rule));
    }
}

#[test]
fn test_default_strategy_on_single_runner_market_is_invalid_field() {
    let snapshot = sample_market("1.1", "York", "", &[(1, "Lonely", 1.5, 1.45)]);
    let market = MarketState::from_snapshot(&snapshot);

    match RuleEvaluator::evaluate(&default_strategy(), &market) {
        Err(WorkbenchError::InvalidField { field, .. }) => {
            assert_eq!(field, FieldName::GapToSecond)
        }
        other => panic!("expected InvalidField, got {:?}", other),
    }
}

// ============================================================================
// Import / Export Tests
// ============================================================================

#[test]
fn test_import_export_round_trip_preserves_unknown_fields() {
    let json = r#"{
        "id": "custom",
        "name": "Custom",
        "owner": "desk-7",
        "rules": [{
            "id": "R1",
            "name": "Back outsiders",
            "priority": 2,
            "ui_colour": "amber",
            "conditions": [
                {"field": "fav_back_odds", "operator": "between", "value": 3.0, "value_high": 6.0}
            ],
            "actions": [{"target": "third_favourite", "bet_type": "BACK", "stake": 0.5}],
            "stop_on_match": false
        }]
    }"#;

    let strategy = Strategy::from_json(json).unwrap();
    assert_eq!(strategy.extra["owner"], "desk-7");
    assert_eq!(strategy.rules[0].extra["ui_colour"], "amber");
    assert_eq!(strategy.version, "1.0");

    let exported = strategy.to_json_pretty().unwrap();
    let reimported = Strategy::from_json(&exported).unwrap();
    assert_eq!(reimported, strategy);
}

#[test]
fn test_round_trip_keeps_thresholds_bit_exact() {
    let thresholds = [29.930560355738358, 20.326822566076938, 24.553999949684606];
    for threshold in thresholds {
        let strategy = Strategy::new("exact", "Exact thresholds").with_rule(
            Rule::new("R1", "Second favourite drifting", 1)
                .with_condition(Condition::new(FieldName::SecondFavLayOdds, OperatorKind::Lt, threshold))
                .with_action(Action::back(TargetRank::SecondFavourite, dec!(0.01))),
        );

        let reimported = Strategy::from_json(&strategy.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            reimported.rules[0].conditions[0].value.to_bits(),
            threshold.to_bits()
        );
        assert_eq!(reimported, strategy);
    }
}

#[test]
fn test_import_rejects_bad_documents() {
    let unknown_field = r#"{"id": "s", "name": "s", "rules": [{"id": "R", "name": "R", "priority": 1,
        "conditions": [{"field": "favourite_odds", "operator": "lt", "value": 2.0}], "actions": []}]}"#;
    assert!(matches!(
        Strategy::from_json(unknown_field),
        Err(WorkbenchError::Validation(_))
    ));

    let zero_stake = r#"{"id": "s", "name": "s", "rules": [{"id": "R", "name": "R", "priority": 1,
        "conditions": [], "actions": [{"target": "favourite", "bet_type": "LAY", "stake": 0}]}]}"#;
    assert!(matches!(
        Strategy::from_json(zero_stake),
        Err(WorkbenchError::Validation(_))
    ));

    let inverted = r#"{"id": "s", "name": "s", "rules": [{"id": "R", "name": "R", "priority": 1,
        "conditions": [{"field": "fav_lay_odds", "operator": "between", "value": 5.0, "value_high": 2.0}],
        "actions": []}]}"#;
    assert!(matches!(
        Strategy::from_json(inverted),
        Err(WorkbenchError::Validation(_))
    ));
}

#[test]
fn test_edits_return_new_values() {
    let original = default_strategy();
    let rule = original.rule("RULE_1").unwrap();
    let edited_rule = rule
        .replace_condition(0, Condition::new(FieldName::FavLayOdds, OperatorKind::Lt, 1.5))
        .unwrap();
    let edited = original.replace_rule("RULE_1", edited_rule).unwrap();

    assert_eq!(original.rule("RULE_1").unwrap().conditions[0].value, 2.0);
    assert_eq!(edited.rule("RULE_1").unwrap().conditions[0].value, 1.5);
    assert!(edited.without_rule("RULE_3B").rule("RULE_3B").is_none());
    assert!(original.rule("RULE_3B").is_some());
}
