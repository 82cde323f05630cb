use crate::domain::actual::ActualTransaction;
use crate::domain::forecast::{ForecastItem, Installment};
use crate::domain::period::DateRange;
use crate::domain::tax::{TaxConfig, VatCategories, VatRegime};
use crate::ledger::recurring::provision_installments;
use crate::taxes::{expand_vat, tax_settlements_for_horizon, vat_settlements_for_horizon};

/// Inputs needed to synthesize the full item set shown for a horizon.
#[derive(Debug, Clone, Copy)]
pub struct DisplayRequest<'a> {
    pub items: &'a [ForecastItem],
    pub actuals: &'a [ActualTransaction],
    pub vat_categories: Option<&'a VatCategories>,
    pub vat_regime: Option<&'a VatRegime>,
    pub tax_configs: &'a [TaxConfig],
    pub horizon: DateRange,
}

pub struct ForecastService;

impl ForecastService {
    /// Declared items, their VAT children, then the VAT and tax settlements
    /// paid within the horizon. Missing VAT or tax setup simply adds nothing.
    pub fn expand_for_display(request: &DisplayRequest<'_>) -> Vec<ForecastItem> {
        let mut expanded = match request.vat_categories {
            Some(categories) => expand_vat(request.items, categories),
            None => request.items.to_vec(),
        };
        let vat_settlements =
            vat_settlements_for_horizon(&expanded, &request.horizon, request.vat_regime);
        let tax_settlements =
            tax_settlements_for_horizon(request.actuals, &request.horizon, request.tax_configs);
        expanded.extend(vat_settlements);
        expanded.extend(tax_settlements);
        expanded
    }

    /// Smoothed provisioning plan of every provisioned item, keyed by item.
    pub fn provision_plans(items: &[ForecastItem]) -> Vec<(&ForecastItem, Vec<Installment>)> {
        items
            .iter()
            .filter(|item| item.is_provisioned())
            .map(|item| (item, provision_installments(item)))
            .collect()
    }
}
