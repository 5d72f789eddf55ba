//! Liability and profit of a single settled bet
//!
//! LAY: the layer keeps the backer's stake when the runner loses and pays out
//! `stake × (price − 1)` when it wins.
//! BACK: the backer wins `stake × (price − 1)` or loses the stake.
//! A removed (non-)runner voids the bet either way.

use rust_decimal::Decimal;

use super::types::RunnerResult;
use crate::strategy::BetType;

/// Worst-case loss of a bet, rounded to pennies
pub fn liability(bet_type: BetType, price: Decimal, stake: Decimal) -> Decimal {
    match bet_type {
        BetType::Lay => (stake * (price - Decimal::ONE)).round_dp(2),
        BetType::Back => stake,
    }
}

/// Realized profit of a bet given its runner's result
pub fn bet_profit(bet_type: BetType, price: Decimal, stake: Decimal, result: RunnerResult) -> Decimal {
    match (bet_type, result) {
        (_, RunnerResult::Removed) | (_, RunnerResult::Unknown) => Decimal::ZERO,
        (BetType::Lay, RunnerResult::Loser) => stake,
        (BetType::Lay, RunnerResult::Winner) => -liability(bet_type, price, stake),
        (BetType::Back, RunnerResult::Winner) => (stake * (price - Decimal::ONE)).round_dp(2),
        (BetType::Back, RunnerResult::Loser) => -stake,
    }
}
