//! Forecast items: declared revenue/expense lines and their schedules.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;
use crate::domain::common::Direction;
use crate::errors::ValidationError;
use crate::ledger::time_interval::{TimeInterval, TimeUnit};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Frequency attribute of a forecast item, as stored by the surrounding application.
pub enum Frequency {
    OneOff,
    Daily,
    Weekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
    Irregular,
}

impl Frequency {
    /// Returns the periodic cadence for recurring frequencies.
    pub fn cadence(self) -> Option<Cadence> {
        match self {
            Frequency::Daily => Some(Cadence::Daily),
            Frequency::Weekly => Some(Cadence::Weekly),
            Frequency::Monthly => Some(Cadence::Monthly),
            Frequency::Bimonthly => Some(Cadence::Bimonthly),
            Frequency::Quarterly => Some(Cadence::Quarterly),
            Frequency::Semiannual => Some(Cadence::Semiannual),
            Frequency::Annual => Some(Cadence::Annual),
            Frequency::OneOff | Frequency::Irregular => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let frequency = match normalized.as_str() {
            "one_off" | "once" | "oneoff" => Frequency::OneOff,
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            "bimonthly" => Frequency::Bimonthly,
            "quarterly" => Frequency::Quarterly,
            "semiannual" | "semi_annual" | "biannual" => Frequency::Semiannual,
            "annual" | "yearly" => Frequency::Annual,
            "irregular" => Frequency::Irregular,
            _ => return None,
        };
        Some(frequency)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::OneOff => "one_off",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Bimonthly => "bimonthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
            Frequency::Irregular => "irregular",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Stepping rule of a periodic schedule.
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Cadence {
    pub fn interval(self) -> TimeInterval {
        let (every, unit) = match self {
            Cadence::Daily => (1, TimeUnit::Day),
            Cadence::Weekly => (1, TimeUnit::Week),
            Cadence::Monthly => (1, TimeUnit::Month),
            Cadence::Bimonthly => (2, TimeUnit::Month),
            Cadence::Quarterly => (3, TimeUnit::Month),
            Cadence::Semiannual => (6, TimeUnit::Month),
            Cadence::Annual => (1, TimeUnit::Year),
        };
        TimeInterval { every, unit }
    }

    pub fn frequency(self) -> Frequency {
        match self {
            Cadence::Daily => Frequency::Daily,
            Cadence::Weekly => Frequency::Weekly,
            Cadence::Monthly => Frequency::Monthly,
            Cadence::Bimonthly => Frequency::Bimonthly,
            Cadence::Quarterly => Frequency::Quarterly,
            Cadence::Semiannual => Frequency::Semiannual,
            Cadence::Annual => Frequency::Annual,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One dated amount of an irregular schedule.
pub struct Installment {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl Installment {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self { date, amount }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// When a forecast item falls due.
pub enum Schedule {
    OneOff {
        date: NaiveDate,
    },
    Periodic {
        cadence: Cadence,
        start: NaiveDate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<NaiveDate>,
    },
    Irregular {
        installments: Vec<Installment>,
    },
}

impl Schedule {
    pub fn one_off(date: NaiveDate) -> Self {
        Schedule::OneOff { date }
    }

    pub fn periodic(
        cadence: Cadence,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        let schedule = Schedule::Periodic {
            cadence,
            start,
            end,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn irregular(mut installments: Vec<Installment>) -> Result<Self, ValidationError> {
        installments.sort_by_key(|installment| installment.date);
        let schedule = Schedule::Irregular { installments };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Schedule::OneOff { .. } => Ok(()),
            Schedule::Periodic { start, end, .. } => match end {
                Some(end) if end < start => Err(ValidationError::EndBeforeStart {
                    start: *start,
                    end: *end,
                }),
                _ => Ok(()),
            },
            Schedule::Irregular { installments } => {
                if installments.is_empty() {
                    return Err(ValidationError::EmptyInstallments);
                }
                if let Some(bad) = installments.iter().find(|i| i.amount.is_sign_negative()) {
                    return Err(ValidationError::NegativeAmount(bad.amount));
                }
                Ok(())
            }
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::OneOff { .. } => Frequency::OneOff,
            Schedule::Periodic { cadence, .. } => cadence.frequency(),
            Schedule::Irregular { .. } => Frequency::Irregular,
        }
    }

    /// Scales every amount carried by the schedule itself (irregular installments).
    pub(crate) fn map_installments(&self, f: impl Fn(Decimal) -> Decimal) -> Schedule {
        match self {
            Schedule::Irregular { installments } => Schedule::Irregular {
                installments: installments
                    .iter()
                    .map(|i| Installment::new(i.date, f(i.amount)))
                    .collect(),
            },
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Lump-sum smoothing metadata.
pub struct Provisioning {
    pub final_payment_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
}

impl Provisioning {
    pub fn new(final_payment_date: NaiveDate) -> Self {
        Self {
            final_payment_date,
            installments: None,
        }
    }

    pub fn with_installments(mut self, installments: u32) -> Result<Self, ValidationError> {
        if installments == 0 {
            return Err(ValidationError::ZeroInstallments);
        }
        self.installments = Some(installments);
        Ok(self)
    }

    /// Explicit count if set, otherwise the count implied by the item's frequency.
    pub fn installment_count(&self, frequency: Frequency) -> u32 {
        if let Some(explicit) = self.installments.filter(|count| *count > 0) {
            return explicit;
        }
        match frequency {
            Frequency::Annual => 12,
            Frequency::Semiannual => 6,
            Frequency::Quarterly => 3,
            Frequency::Bimonthly => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Whether the declared amount already includes VAT.
pub enum VatBasis {
    Inclusive,
    Exclusive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VatLink {
    pub rate_id: String,
    pub basis: VatBasis,
}

impl VatLink {
    pub fn new(rate_id: impl Into<String>, basis: VatBasis) -> Self {
        Self {
            rate_id: rate_id.into(),
            basis,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VatKind {
    Collected,
    Deductible,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "source", rename_all = "snake_case")]
/// Where an item comes from; synthetic rows point back at their source.
pub enum ItemOrigin {
    #[default]
    Declared,
    Vat {
        parent: Uuid,
        kind: VatKind,
    },
    VatSettlement {
        window_start: NaiveDate,
    },
    TaxSettlement {
        config_id: String,
        window_start: NaiveDate,
    },
}

impl ItemOrigin {
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, ItemOrigin::Declared)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// A declared (or synthesized) budget line.
pub struct ForecastItem {
    pub id: Uuid,
    #[serde(default)]
    pub label: String,
    pub direction: Direction,
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub schedule: Schedule,
    #[serde(default)]
    pub off_budget: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning: Option<Provisioning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<VatLink>,
    #[serde(default)]
    pub origin: ItemOrigin,
}

impl ForecastItem {
    pub fn new(
        direction: Direction,
        category: impl Into<String>,
        amount: Decimal,
        schedule: Schedule,
    ) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() {
            return Err(ValidationError::NegativeAmount(amount));
        }
        schedule.validate()?;
        let category = category.into();
        Ok(Self {
            id: Uuid::new_v4(),
            label: category.clone(),
            direction,
            category,
            amount,
            currency: CurrencyCode::default(),
            schedule,
            off_budget: false,
            provisioning: None,
            vat: None,
            origin: ItemOrigin::Declared,
        })
    }

    /// One-off synthetic row dated `date`; the sign of `net` picks the direction.
    pub(crate) fn settlement(
        id: Uuid,
        category: impl Into<String>,
        net: Decimal,
        currency: CurrencyCode,
        date: NaiveDate,
        origin: ItemOrigin,
    ) -> Self {
        let direction = if net.is_sign_negative() {
            Direction::Revenue
        } else {
            Direction::Expense
        };
        let category = category.into();
        Self {
            id,
            label: category.clone(),
            direction,
            category,
            amount: net.abs(),
            currency,
            schedule: Schedule::one_off(date),
            off_budget: false,
            provisioning: None,
            vat: None,
            origin,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_vat(mut self, vat: VatLink) -> Self {
        self.vat = Some(vat);
        self
    }

    pub fn with_provisioning(mut self, provisioning: Provisioning) -> Self {
        self.provisioning = Some(provisioning);
        self
    }

    pub fn off_budget(mut self) -> Self {
        self.off_budget = true;
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.schedule.frequency()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount.is_sign_negative() {
            return Err(ValidationError::NegativeAmount(self.amount));
        }
        self.schedule.validate()
    }

    pub fn is_provisioned(&self) -> bool {
        self.provisioning.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn periodic_schedule_rejects_end_before_start() {
        let err = Schedule::periodic(Cadence::Monthly, date(2024, 5, 1), Some(date(2024, 4, 1)))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EndBeforeStart {
                start: date(2024, 5, 1),
                end: date(2024, 4, 1)
            }
        );
    }

    #[test]
    fn irregular_schedule_sorts_installments() {
        let schedule = Schedule::irregular(vec![
            Installment::new(date(2024, 6, 1), dec!(20)),
            Installment::new(date(2024, 3, 1), dec!(10)),
        ])
        .unwrap();
        match schedule {
            Schedule::Irregular { installments } => {
                assert_eq!(installments[0].date, date(2024, 3, 1));
                assert_eq!(installments[1].date, date(2024, 6, 1));
            }
            other => panic!("unexpected schedule {other:?}"),
        }
    }

    #[test]
    fn empty_irregular_schedule_is_rejected() {
        assert_eq!(
            Schedule::irregular(Vec::new()).unwrap_err(),
            ValidationError::EmptyInstallments
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = ForecastItem::new(
            Direction::Expense,
            "Rent",
            dec!(-1),
            Schedule::one_off(date(2024, 1, 1)),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NegativeAmount(dec!(-1)));
    }

    #[test]
    fn frequency_follows_schedule() {
        let item = ForecastItem::new(
            Direction::Revenue,
            "Sales",
            dec!(100),
            Schedule::periodic(Cadence::Quarterly, date(2024, 1, 1), None).unwrap(),
        )
        .unwrap();
        assert_eq!(item.frequency(), Frequency::Quarterly);
        assert_eq!(item.label, "Sales");
    }

    #[test]
    fn frequency_parse_accepts_aliases() {
        assert_eq!(Frequency::parse("One-Off"), Some(Frequency::OneOff));
        assert_eq!(Frequency::parse("yearly"), Some(Frequency::Annual));
        assert_eq!(Frequency::parse("semi annual"), Some(Frequency::Semiannual));
        assert_eq!(Frequency::parse("fortnightly"), None);
    }

    #[test]
    fn provisioning_count_prefers_explicit_value() {
        let implied = Provisioning::new(date(2024, 12, 1));
        assert_eq!(implied.installment_count(Frequency::Annual), 12);
        assert_eq!(implied.installment_count(Frequency::Semiannual), 6);
        assert_eq!(implied.installment_count(Frequency::OneOff), 1);

        let explicit = Provisioning::new(date(2024, 12, 1))
            .with_installments(4)
            .unwrap();
        assert_eq!(explicit.installment_count(Frequency::Annual), 4);
        assert_eq!(
            Provisioning::new(date(2024, 12, 1))
                .with_installments(0)
                .unwrap_err(),
            ValidationError::ZeroInstallments
        );
    }
}
