//! Strategy module: the rule model and its evaluation
//!
//! A [`Strategy`] is plain data: an ordered list of [`Rule`]s, each an
//! AND-group of [`Condition`]s over market fields plus the [`Action`]s it
//! emits. The [`RuleEvaluator`] turns a strategy and one market's state into
//! the actions to execute.
//!
//! # Evaluation
//!
//! ```text
//!   rules ──sort by priority (stable)──▶ r1, r2, r3 ...
//!                                         │
//!              all conditions hold? ──no──┤ next rule
//!                      │ yes              │
//!                      ▼                  │
//!              emit (rule_id, action)...  │
//!                      │                  │
//!          stop_on_match? ──no────────────┘
//!                      │ yes
//!                      ▼
//!                    done
//! ```
//!
//! # Example
//!
//! ```
//! use backtest_workbench::common::types::MarketState;
//! use backtest_workbench::strategy::{
//!     Action, Condition, FieldName, OperatorKind, Rule, RuleEvaluator, Strategy, TargetRank,
//! };
//! use rust_decimal_macros::dec;
//!
//! let strategy = Strategy::new("s1", "Lay short favourites").with_rule(
//!     Rule::new("RULE_1", "Fav under 2.0", 1)
//!         .with_condition(Condition::new(FieldName::FavLayOdds, OperatorKind::Lt, 2.0))
//!         .with_action(Action::lay(TargetRank::Favourite, dec!(1.0))),
//! );
//!
//! let state = MarketState::new("1.234").with_field(FieldName::FavLayOdds, 1.8);
//! let actions = RuleEvaluator::evaluate(&strategy, &state).unwrap();
//! assert_eq!(actions.len(), 1);
//! assert_eq!(actions[0].rule_id, "RULE_1");
//! ```

mod defaults;
mod evaluator;
mod filters;
mod types;

pub use types::{
    Action,
    BetType,
    Condition,
    FieldName,
    OperatorKind,
    Rule,
    Strategy,
    TargetRank,
};

pub use evaluator::{condition_holds, Evaluation, RuleEvaluator, TriggeredAction};

pub use filters::MarketFilter;

pub use defaults::{default_strategy, DEFAULT_STRATEGY_ID};
