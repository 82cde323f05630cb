//! VAT regime and tax configuration records.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
/// How often a liability is declared and settled.
pub enum DeclarationPeriodicity {
    #[default]
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl DeclarationPeriodicity {
    /// Length of one declaration window in months.
    pub fn months(self) -> u32 {
        match self {
            DeclarationPeriodicity::Monthly => 1,
            DeclarationPeriodicity::Quarterly => 3,
            DeclarationPeriodicity::Semiannual => 6,
            DeclarationPeriodicity::Annual => 12,
        }
    }
}

impl fmt::Display for DeclarationPeriodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclarationPeriodicity::Monthly => "Monthly",
            DeclarationPeriodicity::Quarterly => "Quarterly",
            DeclarationPeriodicity::Semiannual => "Semiannual",
            DeclarationPeriodicity::Annual => "Annual",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// A VAT rate, e.g. `{ id: "standard", rate: 0.20 }`.
pub struct VatRate {
    pub id: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Rates and the category labels given to synthesized VAT rows.
pub struct VatCategories {
    pub rates: Vec<VatRate>,
    #[serde(default = "VatCategories::default_collected")]
    pub collected: String,
    #[serde(default = "VatCategories::default_deductible")]
    pub deductible: String,
}

impl VatCategories {
    pub fn new(rates: Vec<VatRate>) -> Self {
        Self {
            rates,
            collected: Self::default_collected(),
            deductible: Self::default_deductible(),
        }
    }

    pub fn rate(&self, id: &str) -> Option<Decimal> {
        self.rates.iter().find(|rate| rate.id == id).map(|rate| rate.rate)
    }

    fn default_collected() -> String {
        "VAT collected".into()
    }

    fn default_deductible() -> String {
        "VAT deductible".into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VatRegime {
    pub periodicity: DeclarationPeriodicity,
    /// Days between the close of a declaration window and its payment.
    #[serde(default)]
    pub payment_delay_days: u32,
    #[serde(default = "VatRegime::default_category")]
    pub settlement_category: String,
    /// Currency VAT is declared in; settlements are issued in it.
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl VatRegime {
    pub fn new(periodicity: DeclarationPeriodicity, payment_delay_days: u32) -> Self {
        Self {
            periodicity,
            payment_delay_days,
            settlement_category: Self::default_category(),
            currency: CurrencyCode::default(),
        }
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    fn default_category() -> String {
        "VAT settlement".into()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Rule used to compute the tax base from realized payments.
pub enum TaxBase {
    /// Receipts only.
    Revenue,
    /// Receipts minus disbursements, floored at zero.
    Profit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxConfig {
    pub id: String,
    pub label: String,
    pub rate: Decimal,
    pub base: TaxBase,
    pub periodicity: DeclarationPeriodicity,
    #[serde(default)]
    pub payment_delay_days: u32,
    /// Restricts the base to these categories when non-empty.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl TaxConfig {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        rate: Decimal,
        base: TaxBase,
        periodicity: DeclarationPeriodicity,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            rate,
            base,
            periodicity,
            payment_delay_days: 0,
            categories: Vec::new(),
            currency: CurrencyCode::default(),
        }
    }

    pub fn with_payment_delay(mut self, days: u32) -> Self {
        self.payment_delay_days = days;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn applies_to(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }
}
