//! Currency codes, the shared rate table, and conversion into the base currency.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "String")]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange rates expressed against a single reference currency.
///
/// A rate `r` for `EUR` with reference `USD` means `1 USD = r EUR`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateTable {
    pub reference: CurrencyCode,
    #[serde(default)]
    rates: HashMap<CurrencyCode, Decimal>,
}

impl RateTable {
    pub fn new(reference: CurrencyCode) -> Self {
        Self {
            reference,
            rates: HashMap::new(),
        }
    }

    pub fn with_rate(mut self, code: impl Into<CurrencyCode>, rate: Decimal) -> Self {
        self.set_rate(code, rate);
        self
    }

    pub fn set_rate(&mut self, code: impl Into<CurrencyCode>, rate: Decimal) {
        self.rates.insert(code.into(), rate);
    }

    /// Rate of `code` against the reference; the reference itself is 1.
    pub fn rate(&self, code: &CurrencyCode) -> Option<Decimal> {
        if code == &self.reference {
            return Some(self.rates.get(code).copied().unwrap_or(Decimal::ONE));
        }
        self.rates.get(code).copied().filter(|rate| !rate.is_zero())
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new(CurrencyCode::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    /// Source and target are the same currency.
    Identity,
    Converted,
    /// No usable rate; the amount is returned as-is.
    RateUnavailable { missing: CurrencyCode },
}

/// Result of a conversion, keeping track of whether a rate was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub amount: Decimal,
    pub status: ConversionStatus,
}

impl Conversion {
    pub fn is_converted(&self) -> bool {
        !matches!(self.status, ConversionStatus::RateUnavailable { .. })
    }
}

/// Converts `amount` from one currency into another through the reference
/// currency: divide by the source rate, multiply by the target rate.
pub fn convert(
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    table: &RateTable,
) -> Conversion {
    if from == to {
        return Conversion {
            amount,
            status: ConversionStatus::Identity,
        };
    }
    let Some(from_rate) = table.rate(from) else {
        return unavailable(amount, from);
    };
    let Some(to_rate) = table.rate(to) else {
        return unavailable(amount, to);
    };
    Conversion {
        amount: amount / from_rate * to_rate,
        status: ConversionStatus::Converted,
    }
}

fn unavailable(amount: Decimal, missing: &CurrencyCode) -> Conversion {
    Conversion {
        amount,
        status: ConversionStatus::RateUnavailable {
            missing: missing.clone(),
        },
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "JPY" => "¥".into(),
        "AUD" => "A$".into(),
        _ => code.into(),
    }
}

pub fn minor_units_for(code: &str) -> u32 {
    match code {
        "JPY" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Formats an amount with grouping separators and the currency symbol,
/// e.g. `-€1,234.50`.
pub fn format_amount(amount: Decimal, code: &CurrencyCode) -> String {
    let precision = minor_units_for(code.as_str());
    let body = format!("{:.*}", precision as usize, amount.abs());
    let (int_part, fraction) = match body.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (body.as_str(), None),
    };
    let mut rendered = group_digits(int_part, ',');
    if let Some(fraction) = fraction {
        rendered.push('.');
        rendered.push_str(fraction);
    }
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}", sign, symbol_for(code.as_str()), rendered)
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}
