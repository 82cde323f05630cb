//! VAT children of declared items and the periodic VAT settlement.

use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::common::{round_money, Direction};
use crate::domain::forecast::{ForecastItem, ItemOrigin, VatBasis, VatKind};
use crate::domain::period::{DateRange, Period};
use crate::domain::tax::{VatCategories, VatRegime};
use crate::ledger::recurring::budgeted_amount_in_range;
use crate::taxes::declaration::{settlement_date, windows_settled_in};

/// Tax part of `amount` at `rate`, rounded to cents.
pub fn vat_amount(amount: Decimal, rate: Decimal, basis: VatBasis) -> Decimal {
    let tax = match basis {
        VatBasis::Exclusive => amount * rate,
        VatBasis::Inclusive => amount * rate / (Decimal::ONE + rate),
    };
    round_money(tax)
}

/// Stable identifier of the VAT child derived from `parent`.
pub fn vat_child_id(parent: Uuid) -> Uuid {
    Uuid::new_v5(&parent, b"vat")
}

/// Returns the declared items followed, for each VAT-linked one, by its VAT
/// child. Inclusive parents are emitted at their net amount.
///
/// Only [`ItemOrigin::Declared`] items are expanded, so feeding synthetic rows
/// back in never produces VAT on VAT.
pub fn expand_vat(items: &[ForecastItem], categories: &VatCategories) -> Vec<ForecastItem> {
    let mut expanded = Vec::with_capacity(items.len());
    for item in items {
        let Some(link) = item.vat.as_ref().filter(|_| !item.origin.is_synthetic()) else {
            expanded.push(item.clone());
            continue;
        };
        let Some(rate) = categories.rate(&link.rate_id) else {
            warn!(
                item_id = %item.id,
                rate_id = %link.rate_id,
                "unknown VAT rate; item left without VAT"
            );
            expanded.push(item.clone());
            continue;
        };

        let tax_of = |amount: Decimal| vat_amount(amount, rate, link.basis);
        let (kind, category) = match item.direction {
            Direction::Revenue => (VatKind::Collected, categories.collected.as_str()),
            Direction::Expense => (VatKind::Deductible, categories.deductible.as_str()),
        };

        let mut parent = item.clone();
        if link.basis == VatBasis::Inclusive {
            parent.amount = item.amount - tax_of(item.amount);
            parent.schedule = item.schedule.map_installments(|amount| amount - tax_of(amount));
        }

        let child = ForecastItem {
            id: vat_child_id(item.id),
            label: format!("{} ({})", item.label, category),
            direction: item.direction,
            category: category.to_string(),
            amount: tax_of(item.amount),
            currency: item.currency.clone(),
            schedule: item.schedule.map_installments(tax_of),
            off_budget: item.off_budget,
            provisioning: item.provisioning.clone(),
            vat: None,
            origin: ItemOrigin::Vat {
                parent: item.id,
                kind,
            },
        };
        expanded.push(parent);
        expanded.push(child);
    }
    expanded
}

/// Collected minus deductible VAT budgeted within `window`.
///
/// Children in a currency other than `regime.currency` cannot be netted and
/// are left out.
pub fn vat_net_for_window(
    expanded_items: &[ForecastItem],
    window: &DateRange,
    regime: &VatRegime,
) -> Decimal {
    let mut net = Decimal::ZERO;
    for item in expanded_items {
        let ItemOrigin::Vat { kind, .. } = &item.origin else {
            continue;
        };
        if item.currency != regime.currency {
            warn!(
                item_id = %item.id,
                currency = %item.currency,
                declared_in = %regime.currency,
                "VAT row in foreign currency left out of the settlement"
            );
            continue;
        }
        let amount = budgeted_amount_in_range(item, window);
        match kind {
            VatKind::Collected => net += amount,
            VatKind::Deductible => net -= amount,
        }
    }
    net
}

/// Settlement row for one declaration window: an expense when VAT is owed, a
/// revenue when a credit is due, nothing when the window nets to zero.
pub fn generate_vat_payment_entries(
    expanded_items: &[ForecastItem],
    window: &Period,
    regime: &VatRegime,
) -> Vec<ForecastItem> {
    let net = vat_net_for_window(expanded_items, &window.range, regime);
    if net.is_zero() {
        debug!(window = %window.label, "VAT window nets to zero");
        return Vec::new();
    }
    let Some(due) = settlement_date(window, regime.payment_delay_days) else {
        return Vec::new();
    };
    let id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("vat-settlement:{}", window.start()).as_bytes(),
    );
    let settlement = ForecastItem::settlement(
        id,
        regime.settlement_category.clone(),
        net,
        regime.currency.clone(),
        due,
        ItemOrigin::VatSettlement {
            window_start: window.start(),
        },
    )
    .with_label(format!("{} {}", regime.settlement_category, window.label));
    vec![settlement]
}

/// VAT settlements whose payment date falls inside `horizon`.
pub fn vat_settlements_for_horizon(
    expanded_items: &[ForecastItem],
    horizon: &DateRange,
    regime: Option<&VatRegime>,
) -> Vec<ForecastItem> {
    let Some(regime) = regime else {
        return Vec::new();
    };
    windows_settled_in(regime.periodicity, regime.payment_delay_days, horizon)
        .iter()
        .flat_map(|(window, _)| generate_vat_payment_entries(expanded_items, window, regime))
        .collect()
}
