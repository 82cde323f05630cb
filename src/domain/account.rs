use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;

/// A liquidity pool feeding the opening balance of a projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CashAccount {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub initial_balance: Decimal,
    pub initial_balance_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_on: Option<NaiveDate>,
}

impl CashAccount {
    pub fn new(
        name: impl Into<String>,
        initial_balance: Decimal,
        initial_balance_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency: CurrencyCode::default(),
            initial_balance,
            initial_balance_date,
            closed_on: None,
        }
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    pub fn close(&mut self, closed_on: NaiveDate) {
        self.closed_on = Some(closed_on);
    }

    /// True once the closure date has been reached.
    pub fn is_closed_as_of(&self, date: NaiveDate) -> bool {
        self.closed_on.is_some_and(|closed| closed <= date)
    }
}
