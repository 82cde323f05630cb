use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::currency::RateTable;
use crate::domain::account::CashAccount;
use crate::domain::actual::ActualTransaction;
use crate::domain::forecast::ForecastItem;
use crate::domain::period::Period;
use crate::domain::records::{load_forecast_values, LoadReport};
use crate::domain::tax::{TaxConfig, VatCategories, VatRegime};
use crate::simulation::Scenario;

use super::services::projection_service::ProjectionRequest;

/// Everything a projection reads, as handed over by the surrounding store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionSnapshot {
    /// Raw item records, kept untyped until [`Self::forecast_items`].
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub actuals: Vec<ActualTransaction>,
    #[serde(default)]
    pub accounts: Vec<CashAccount>,
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_categories: Option<VatCategories>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_regime: Option<VatRegime>,
    #[serde(default)]
    pub tax_configs: Vec<TaxConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
}

impl ProjectionSnapshot {
    /// Converts the raw item records; malformed ones are reported, not fatal.
    pub fn forecast_items(&self) -> LoadReport {
        load_forecast_values(self.items.clone())
    }

    /// Borrows the snapshot into a request over `items` and `periods`.
    pub fn request<'a>(
        &'a self,
        items: &'a [ForecastItem],
        periods: &'a [Period],
        today: NaiveDate,
    ) -> ProjectionRequest<'a> {
        ProjectionRequest {
            periods,
            items,
            actuals: &self.actuals,
            accounts: &self.accounts,
            rates: &self.rates,
            vat_categories: self.vat_categories.as_ref(),
            vat_regime: self.vat_regime.as_ref(),
            tax_configs: &self.tax_configs,
            today,
        }
    }
}
