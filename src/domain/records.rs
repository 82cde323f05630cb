//! Conversion from loosely-typed store records into validated forecast items.
//!
//! The surrounding application hands items over with string dates and amounts.
//! A record that cannot be converted is set aside and reported; it never
//! prevents the rest of the batch from loading.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::currency::CurrencyCode;
use crate::domain::common::Direction;
use crate::domain::forecast::{
    ForecastItem, Frequency, Installment, Provisioning, Schedule, VatBasis, VatLink,
};
use crate::errors::ValidationError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid date in `{field}`: {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("invalid amount in `{field}`: {value}")]
    InvalidAmount { field: &'static str, value: String },
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("unknown frequency: {0}")]
    UnknownFrequency(String),
    #[error("unknown direction: {0}")]
    UnknownDirection(String),
    #[error("unknown VAT basis: {0}")]
    UnknownVatBasis(String),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallmentRecord {
    pub date: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Raw forecast item as persisted by the CRUD layer.
pub struct ForecastItemRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub direction: String,
    pub category: String,
    pub frequency: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub installments: Vec<InstallmentRecord>,
    #[serde(default)]
    pub off_budget: bool,
    #[serde(default)]
    pub provision_final_date: Option<String>,
    #[serde(default)]
    pub provision_installments: Option<u32>,
    #[serde(default)]
    pub vat_rate_id: Option<String>,
    #[serde(default)]
    pub vat_basis: Option<String>,
}

impl TryFrom<ForecastItemRecord> for ForecastItem {
    type Error = RecordError;

    fn try_from(record: ForecastItemRecord) -> Result<Self, Self::Error> {
        let direction = parse_direction(&record.direction)?;
        let frequency = Frequency::parse(&record.frequency)
            .ok_or_else(|| RecordError::UnknownFrequency(record.frequency.clone()))?;

        let schedule = match frequency {
            Frequency::OneOff => Schedule::one_off(required_date("date", record.date.as_deref())?),
            Frequency::Irregular => {
                let installments = record
                    .installments
                    .iter()
                    .map(|raw| {
                        Ok(Installment::new(
                            parse_date("installments.date", &raw.date)?,
                            parse_amount("installments.amount", &raw.amount)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, RecordError>>()?;
                Schedule::irregular(installments)?
            }
            periodic => {
                let cadence = periodic
                    .cadence()
                    .ok_or_else(|| RecordError::UnknownFrequency(record.frequency.clone()))?;
                let start = required_date("start_date", record.start_date.as_deref())?;
                let end = optional_date("end_date", record.end_date.as_deref())?;
                Schedule::periodic(cadence, start, end)?
            }
        };

        let amount = match (&schedule, record.amount.as_deref()) {
            (_, Some(raw)) => parse_amount("amount", raw)?,
            (Schedule::Irregular { installments }, None) => {
                installments.iter().map(|i| i.amount).sum()
            }
            (_, None) => return Err(RecordError::MissingField("amount")),
        };

        let mut item = ForecastItem::new(direction, record.category, amount, schedule)?;
        if let Some(raw_id) = record.id {
            let id = Uuid::parse_str(raw_id.trim()).map_err(|_| RecordError::InvalidId(raw_id))?;
            item = item.with_id(id);
        }
        if let Some(label) = record.label.filter(|label| !label.trim().is_empty()) {
            item = item.with_label(label);
        }
        if let Some(currency) = record.currency.filter(|c| !c.trim().is_empty()) {
            item = item.with_currency(CurrencyCode::new(currency.trim()));
        }
        if record.off_budget {
            item = item.off_budget();
        }
        let provision_final_date = optional_date(
            "provision_final_date",
            record.provision_final_date.as_deref(),
        )?;
        if let Some(final_date) = provision_final_date {
            let mut provisioning = Provisioning::new(final_date);
            if let Some(count) = record.provision_installments {
                provisioning = provisioning.with_installments(count)?;
            }
            item = item.with_provisioning(provisioning);
        }
        if let Some(rate_id) = record.vat_rate_id.filter(|id| !id.trim().is_empty()) {
            let basis = match record.vat_basis.as_deref().map(str::trim) {
                None | Some("exclusive") => VatBasis::Exclusive,
                Some("inclusive") => VatBasis::Inclusive,
                Some(other) => return Err(RecordError::UnknownVatBasis(other.to_string())),
            };
            item = item.with_vat(VatLink::new(rate_id, basis));
        }
        Ok(item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub index: usize,
    pub id: Option<String>,
    pub error: RecordError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub items: Vec<ForecastItem>,
    pub rejected: Vec<RejectedRecord>,
}

impl LoadReport {
    fn accept(
        &mut self,
        index: usize,
        id: Option<String>,
        outcome: Result<ForecastItem, RecordError>,
    ) {
        match outcome {
            Ok(item) => self.items.push(item),
            Err(error) => {
                warn!(index, id = ?id, %error, "skipping malformed forecast record");
                self.rejected.push(RejectedRecord { index, id, error });
            }
        }
    }
}

/// Converts a batch of records, isolating the malformed ones.
pub fn load_forecast_items(records: Vec<ForecastItemRecord>) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, record) in records.into_iter().enumerate() {
        let id = record.id.clone();
        report.accept(index, id, ForecastItem::try_from(record));
    }
    report
}

/// Same as [`load_forecast_items`], but starting from untyped JSON so that a
/// record with the wrong shape is rejected on its own.
pub fn load_forecast_values(values: Vec<Value>) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, value) in values.into_iter().enumerate() {
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);
        let outcome = serde_json::from_value::<ForecastItemRecord>(value)
            .map_err(|err| RecordError::Malformed(err.to_string()))
            .and_then(ForecastItem::try_from);
        report.accept(index, id, outcome);
    }
    report
}

fn parse_direction(raw: &str) -> Result<Direction, RecordError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "revenue" | "income" => Ok(Direction::Revenue),
        "expense" => Ok(Direction::Expense),
        _ => Err(RecordError::UnknownDirection(raw.to_string())),
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| RecordError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

fn required_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, RecordError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_date(field, value),
        None => Err(RecordError::MissingField(field)),
    }
}

fn optional_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, RecordError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_date(field, value))
        .transpose()
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Decimal, RecordError> {
    Decimal::from_str(raw.trim()).map_err(|_| RecordError::InvalidAmount {
        field,
        value: raw.to_string(),
    })
}
