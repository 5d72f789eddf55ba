//! Starter strategy served when nothing has been authored yet

use rust_decimal_macros::dec;

use super::filters::MarketFilter;
use super::types::{Action, Condition, FieldName, OperatorKind, Rule, Strategy, TargetRank};

/// Well-known id of the default strategy
pub const DEFAULT_STRATEGY_ID: &str = "default";

/// Lay the favourite of UK/IE win markets, staking by odds band.
pub fn default_strategy() -> Strategy {
    let mut strategy = Strategy::new(DEFAULT_STRATEGY_ID, "Default - UK/IE Favourite Lay")
        .with_market_filters(MarketFilter::default());
    strategy.description =
        "Lay the favourite based on odds thresholds, adding the second favourite when the gap is tight."
            .to_string();

    strategy
        .with_rule(
            Rule::new("RULE_1", "Strong favourite (odds < 2.0)", 1)
                .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Lt, 2.0))
                .with_action(Action::lay(TargetRank::Favourite, dec!(3.0))),
        )
        .with_rule(
            Rule::new("RULE_2", "Mid-range favourite (2.0-5.0)", 2)
                .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Gte, 2.0))
                .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Lte, 5.0))
                .with_action(Action::lay(TargetRank::Favourite, dec!(2.0))),
        )
        .with_rule(
            Rule::new("RULE_3A", "High odds, tight gap to 2nd", 3)
                .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Gt, 5.0))
                .with_condition(Condition::new(FieldName::GapToSecond, OperatorKind::Lt, 2.0))
                .with_action(Action::lay(TargetRank::Favourite, dec!(1.0)))
                .with_action(Action::lay(TargetRank::SecondFavourite, dec!(1.0))),
        )
        .with_rule(
            Rule::new("RULE_3B", "High odds, wide gap to 2nd", 4)
                .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Gt, 5.0))
                .with_condition(Condition::new(FieldName::GapToSecond, OperatorKind::Gte, 2.0))
                .with_action(Action::lay(TargetRank::Favourite, dec!(1.0))),
        )
}
