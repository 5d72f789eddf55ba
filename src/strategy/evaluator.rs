use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::types::{Action, Condition, OperatorKind, Rule, Strategy};
use crate::common::errors::{Result, WorkbenchError};
use crate::common::types::MarketState;

/// An action emitted by a matching rule, tagged with that rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAction {
    pub rule_id: String,
    pub rule_name: String,
    pub action: Action,
}

/// Full trace of one strategy evaluation against one market
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Actions in emission order: rule priority order, then stored action order
    pub actions: Vec<TriggeredAction>,
    /// Ids of the rules whose conditions all held, in evaluation order
    pub matched_rules: Vec<String>,
    /// Ids of every rule that was tested, in evaluation order
    pub evaluated_rules: Vec<String>,
    /// Rule whose `stop_on_match` ended evaluation early
    pub stopped_by: Option<String>,
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        !self.matched_rules.is_empty()
    }

    pub fn last_match(&self) -> Option<&str> {
        self.matched_rules.last().map(String::as_str)
    }
}

/// Priority-ordered, short-circuiting rule matcher
///
/// Pure: the same strategy and market state always give the same result, and
/// neither input is modified. Markets can be evaluated concurrently.
///
/// Conditions are checked against the market before any rule runs. A
/// pre-race market that lacks a referenced price field (a single-runner
/// market has no `gap_to_second`) fails with [`WorkbenchError::InvalidField`]
/// as a whole, so the simulator skips it rather than evaluating it partially.
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Actions a strategy emits for one market, as `(rule, action)` pairs
    pub fn evaluate(strategy: &Strategy, state: &MarketState) -> Result<Vec<TriggeredAction>> {
        Ok(Self::evaluate_detailed(strategy, state)?.actions)
    }

    /// Like [`RuleEvaluator::evaluate`] but also reports which rules were
    /// tested and which matched.
    ///
    /// Every condition of every rule is checked up front, so a bad range or
    /// a field the market does not carry fails the call even when an earlier
    /// rule would have stopped evaluation.
    pub fn evaluate_detailed(strategy: &Strategy, state: &MarketState) -> Result<Evaluation> {
        let ordered = strategy.rules_by_priority();
        for rule in &ordered {
            Self::check_rule(rule, state)?;
        }

        let mut evaluation = Evaluation::default();
        for rule in ordered {
            evaluation.evaluated_rules.push(rule.id.clone());

            if !Self::rule_matches(rule, state) {
                trace!(market_id = %state.market_id, rule_id = %rule.id, "rule did not match");
                continue;
            }

            debug!(
                market_id = %state.market_id,
                rule_id = %rule.id,
                actions = rule.actions.len(),
                "rule matched"
            );
            evaluation.matched_rules.push(rule.id.clone());
            evaluation
                .actions
                .extend(rule.actions.iter().map(|action| TriggeredAction {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    action: action.clone(),
                }));

            if rule.stop_on_match {
                evaluation.stopped_by = Some(rule.id.clone());
                break;
            }
        }

        Ok(evaluation)
    }

    fn check_rule(rule: &Rule, state: &MarketState) -> Result<()> {
        for condition in &rule.conditions {
            if condition.operator == OperatorKind::Between && condition.range().is_none() {
                return Err(WorkbenchError::InvalidRange {
                    rule_id: rule.id.clone(),
                    field: condition.field,
                    low: condition.value,
                    high: condition.value_high,
                });
            }
            if state.get(condition.field).is_none() {
                return Err(WorkbenchError::InvalidField {
                    rule_id: rule.id.clone(),
                    field: condition.field,
                });
            }
        }
        Ok(())
    }

    fn rule_matches(rule: &Rule, state: &MarketState) -> bool {
        rule.conditions.iter().all(|condition| {
            state
                .get(condition.field)
                .map(|actual| condition_holds(condition, actual))
                .unwrap_or(false)
        })
    }
}

/// Apply a condition's operator to the field's current value
pub fn condition_holds(condition: &Condition, actual: f64) -> bool {
    let value = condition.value;
    match condition.operator {
        OperatorKind::Lt => actual < value,
        OperatorKind::Lte => actual <= value,
        OperatorKind::Gt => actual > value,
        OperatorKind::Gte => actual >= value,
        OperatorKind::Eq => actual == value,
        OperatorKind::Neq => actual != value,
        OperatorKind::Between => condition
            .range()
            .map(|(low, high)| low <= actual && actual <= high)
            .unwrap_or(false),
    }
}
