//! Small value types used across the treasury domain.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places kept for derived monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a derived amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether a forecast line brings cash in or sends it out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Revenue,
    Expense,
}

impl Direction {
    /// Applies the cash sign convention: revenue positive, expense negative.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Direction::Revenue => amount,
            Direction::Expense => -amount,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Revenue => "Revenue",
            Direction::Expense => "Expense",
        };
        f.write_str(label)
    }
}
