use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::currency::CurrencyCode;
use crate::domain::common::Direction;
use crate::domain::forecast::{ForecastItem, Provisioning, Schedule, VatLink};

fn default_scenario_id() -> Uuid {
    Uuid::new_v4()
}

/// A named what-if overlay: an ordered list of deltas over the base items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_scenario_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deltas: Vec<ScenarioDelta>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            notes: None,
            created_at: Utc::now(),
            deltas: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn add_item(mut self, item: ForecastItem) -> Self {
        self.deltas.push(ScenarioDelta::Add(item));
        self
    }

    pub fn override_item(mut self, id: Uuid, patch: ForecastItemPatch) -> Self {
        self.deltas.push(ScenarioDelta::Override { id, patch });
        self
    }

    pub fn delete_item(mut self, id: Uuid) -> Self {
        self.deltas.push(ScenarioDelta::Delete { id });
        self
    }

    /// Base items with this scenario's deltas applied; `base` is untouched.
    pub fn resolve(&self, base: &[ForecastItem]) -> Vec<ForecastItem> {
        super::engine::resolve(base, &self.deltas)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioDelta {
    Add(ForecastItem),
    Override { id: Uuid, patch: ForecastItemPatch },
    Delete { id: Uuid },
}

impl ScenarioDelta {
    pub fn summary(&self) -> String {
        match self {
            ScenarioDelta::Add(item) => {
                format!("Add {} ({} {})", item.label, item.direction, item.amount)
            }
            ScenarioDelta::Override { id, patch } => {
                format!("Override {} ({} field(s))", id, patch.field_count())
            }
            ScenarioDelta::Delete { id } => format!("Delete {}", id),
        }
    }
}

/// Field-level override; `None` leaves the field alone. Nullable fields use
/// `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForecastItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_budget: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioning: Option<Option<Provisioning>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub vat: Option<Option<VatLink>>,
}

impl ForecastItemPatch {
    pub fn amount(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    fn field_count(&self) -> usize {
        [
            self.label.is_some(),
            self.direction.is_some(),
            self.category.is_some(),
            self.amount.is_some(),
            self.currency.is_some(),
            self.schedule.is_some(),
            self.off_budget.is_some(),
            self.provisioning.is_some(),
            self.vat.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Keeps an explicit JSON `null` apart from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
