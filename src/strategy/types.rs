use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::filters::MarketFilter;
use crate::common::errors::{Result, WorkbenchError};

/// Numeric feature of a market's current state that a condition can test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    FavLayOdds,
    FavBackOdds,
    SecondFavLayOdds,
    SecondFavBackOdds,
    GapToSecond,
    RunnerCount,
    TotalMatched,
    FavTotalMatched,
}

impl FieldName {
    pub const ALL: [FieldName; 8] = [
        FieldName::FavLayOdds,
        FieldName::FavBackOdds,
        FieldName::SecondFavLayOdds,
        FieldName::SecondFavBackOdds,
        FieldName::GapToSecond,
        FieldName::RunnerCount,
        FieldName::TotalMatched,
        FieldName::FavTotalMatched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::FavLayOdds => "fav_lay_odds",
            FieldName::FavBackOdds => "fav_back_odds",
            FieldName::SecondFavLayOdds => "second_fav_lay_odds",
            FieldName::SecondFavBackOdds => "second_fav_back_odds",
            FieldName::GapToSecond => "gap_to_second",
            FieldName::RunnerCount => "runner_count",
            FieldName::TotalMatched => "total_matched",
            FieldName::FavTotalMatched => "fav_total_matched",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between a market field and a condition's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    /// Inclusive range `[value, value_high]`
    Between,
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperatorKind::Lt => "lt",
            OperatorKind::Lte => "lte",
            OperatorKind::Gt => "gt",
            OperatorKind::Gte => "gte",
            OperatorKind::Eq => "eq",
            OperatorKind::Neq => "neq",
            OperatorKind::Between => "between",
        };
        f.write_str(s)
    }
}

/// Runner selected by its current odds rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRank {
    Favourite,
    SecondFavourite,
    ThirdFavourite,
}

impl TargetRank {
    /// Zero-based position in the odds-ranked runner list
    pub fn index(&self) -> usize {
        match self {
            TargetRank::Favourite => 0,
            TargetRank::SecondFavourite => 1,
            TargetRank::ThirdFavourite => 2,
        }
    }
}

impl std::fmt::Display for TargetRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRank::Favourite => write!(f, "favourite"),
            TargetRank::SecondFavourite => write!(f, "second_favourite"),
            TargetRank::ThirdFavourite => write!(f, "third_favourite"),
        }
    }
}

/// Bet direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetType {
    #[default]
    Lay,
    Back,
}

impl std::fmt::Display for BetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetType::Lay => write!(f, "LAY"),
            BetType::Back => write!(f, "BACK"),
        }
    }
}

/// Predicate over one market field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: FieldName,
    pub operator: OperatorKind,
    pub value: f64,
    /// Upper bound, only read by `between`
    #[serde(default)]
    pub value_high: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Condition {
    pub fn new(field: FieldName, operator: OperatorKind, value: f64) -> Self {
        Self {
            field,
            operator,
            value,
            value_high: None,
            extra: Map::new(),
        }
    }

    pub fn between(field: FieldName, low: f64, high: f64) -> Self {
        Self {
            value_high: Some(high),
            ..Self::new(field, OperatorKind::Between, low)
        }
    }

    /// The inclusive `[low, high]` range of a `between` condition, if usable.
    ///
    /// Returns `None` for other operators and for a missing, non-finite or
    /// inverted upper bound.
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.operator != OperatorKind::Between || !self.value.is_finite() {
            return None;
        }
        match self.value_high {
            Some(high) if high.is_finite() && high >= self.value => Some((self.value, high)),
            _ => None,
        }
    }
}

/// Instruction to bet a stake on a rank-selected runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub target: TargetRank,
    #[serde(default)]
    pub bet_type: BetType,
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    pub fn new(target: TargetRank, bet_type: BetType, stake: Decimal) -> Self {
        Self {
            target,
            bet_type,
            stake,
            extra: Map::new(),
        }
    }

    pub fn lay(target: TargetRank, stake: Decimal) -> Self {
        Self::new(target, BetType::Lay, stake)
    }

    pub fn back(target: TargetRank, stake: Decimal) -> Self {
        Self::new(target, BetType::Back, stake)
    }
}

fn default_stop_on_match() -> bool {
    true
}

/// AND-group of conditions with the actions it emits when all of them hold
///
/// Update operations never touch `self`; each returns a new rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Lower runs first
    pub priority: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default = "default_stop_on_match")]
    pub stop_on_match: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, priority: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            conditions: Vec::new(),
            actions: Vec::new(),
            stop_on_match: true,
            extra: Map::new(),
        }
    }

    pub fn with_condition(&self, condition: Condition) -> Self {
        let mut rule = self.clone();
        rule.conditions.push(condition);
        rule
    }

    pub fn with_action(&self, action: Action) -> Self {
        let mut rule = self.clone();
        rule.actions.push(action);
        rule
    }

    pub fn with_priority(&self, priority: u32) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    pub fn with_stop_on_match(&self, stop_on_match: bool) -> Self {
        Self {
            stop_on_match,
            ..self.clone()
        }
    }

    pub fn replace_condition(&self, index: usize, condition: Condition) -> Result<Self> {
        let mut rule = self.clone();
        let slot = rule.conditions.get_mut(index).ok_or_else(|| {
            WorkbenchError::Validation(format!("rule {} has no condition {}", self.id, index))
        })?;
        *slot = condition;
        Ok(rule)
    }

    pub fn remove_condition(&self, index: usize) -> Result<Self> {
        if index >= self.conditions.len() {
            return Err(WorkbenchError::Validation(format!(
                "rule {} has no condition {}",
                self.id, index
            )));
        }
        let mut rule = self.clone();
        rule.conditions.remove(index);
        Ok(rule)
    }

    pub fn remove_action(&self, index: usize) -> Result<Self> {
        if index >= self.actions.len() {
            return Err(WorkbenchError::Validation(format!(
                "rule {} has no action {}",
                self.id, index
            )));
        }
        let mut rule = self.clone();
        rule.actions.remove(index);
        Ok(rule)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| WorkbenchError::Validation(format!("rule {}: {}", self.id, msg));

        if self.id.trim().is_empty() {
            return Err(WorkbenchError::Validation("rule id must not be empty".to_string()));
        }
        if self.priority < 1 {
            return Err(invalid(format!("priority must be >= 1, got {}", self.priority)));
        }

        for condition in &self.conditions {
            if !condition.value.is_finite() {
                return Err(invalid(format!("{} value must be a finite number", condition.field)));
            }
            if condition.operator == OperatorKind::Between && condition.range().is_none() {
                return Err(invalid(match condition.value_high {
                    None => format!("between on {} requires value_high", condition.field),
                    Some(high) => format!(
                        "between on {} has value_high {} below value {}",
                        condition.field, high, condition.value
                    ),
                }));
            }
        }

        for action in &self.actions {
            if action.stake <= Decimal::ZERO {
                return Err(invalid(format!(
                    "stake on {} must be positive, got {}",
                    action.target, action.stake
                )));
            }
        }

        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Named, ordered collection of rules
///
/// `rules` keeps the order it was authored in. Evaluation order comes from
/// [`Strategy::rules_by_priority`] and is never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub market_filters: Option<MarketFilter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Strategy {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: default_version(),
            rules: Vec::new(),
            market_filters: None,
            extra: Map::new(),
        }
    }

    /// Parse a strategy from its JSON export and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let strategy: Strategy = serde_json::from_str(json)
            .map_err(|e| WorkbenchError::Validation(format!("invalid strategy JSON: {}", e)))?;
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// Rules in evaluation order: ascending priority, ties kept in list order
    pub fn rules_by_priority(&self) -> Vec<&Rule> {
        let mut ordered: Vec<&Rule> = self.rules.iter().collect();
        ordered.sort_by_key(|rule| rule.priority);
        ordered
    }

    pub fn with_rule(&self, rule: Rule) -> Self {
        let mut strategy = self.clone();
        strategy.rules.push(rule);
        strategy
    }

    pub fn without_rule(&self, rule_id: &str) -> Self {
        let mut strategy = self.clone();
        strategy.rules.retain(|r| r.id != rule_id);
        strategy
    }

    pub fn replace_rule(&self, rule_id: &str, rule: Rule) -> Result<Self> {
        let mut strategy = self.clone();
        let slot = strategy
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| WorkbenchError::Validation(format!("no rule with id {}", rule_id)))?;
        *slot = rule;
        Ok(strategy)
    }

    pub fn with_market_filters(&self, filters: MarketFilter) -> Self {
        Self {
            market_filters: Some(filters),
            ..self.clone()
        }
    }

    /// Check the strategy invariants: non-empty id, unique rule ids, and every
    /// rule's priority, conditions and stakes.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(WorkbenchError::Validation(
                "strategy id must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(WorkbenchError::Validation(format!(
                    "duplicate rule id {} in strategy {}",
                    rule.id, self.id
                )));
            }
            rule.validate()?;
        }

        Ok(())
    }
}
