//! Income-style tax settlements computed from realized payments.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::actual::{ActualTransaction, SettlementDirection};
use crate::domain::common::round_money;
use crate::domain::forecast::{ForecastItem, ItemOrigin};
use crate::domain::period::{DateRange, Period};
use crate::domain::tax::{TaxBase, TaxConfig};
use crate::taxes::declaration::{settlement_date, windows_settled_in};

/// Base of `config` over the payments dated inside `window`.
pub fn tax_base_for_window(
    actuals: &[ActualTransaction],
    window: &DateRange,
    config: &TaxConfig,
) -> Decimal {
    let mut receipts = Decimal::ZERO;
    let mut disbursements = Decimal::ZERO;
    for actual in actuals
        .iter()
        .filter(|actual| config.applies_to(&actual.category))
    {
        let paid: Decimal = actual
            .payments
            .iter()
            .filter(|payment| window.contains(payment.payment_date))
            .map(|payment| payment.paid_amount)
            .sum();
        match actual.direction {
            SettlementDirection::Receivable => receipts += paid,
            SettlementDirection::Payable => disbursements += paid,
        }
    }
    match config.base {
        TaxBase::Revenue => receipts,
        TaxBase::Profit => (receipts - disbursements).max(Decimal::ZERO),
    }
}

/// One expense settlement for `window` when the computed tax is positive.
pub fn generate_tax_payment_entries(
    actuals: &[ActualTransaction],
    window: &Period,
    config: &TaxConfig,
) -> Vec<ForecastItem> {
    let amount = round_money(tax_base_for_window(actuals, &window.range, config) * config.rate);
    if amount <= Decimal::ZERO {
        return Vec::new();
    }
    let Some(due) = settlement_date(window, config.payment_delay_days) else {
        return Vec::new();
    };
    let id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("tax-settlement:{}:{}", config.id, window.start()).as_bytes(),
    );
    let settlement = ForecastItem::settlement(
        id,
        config.label.clone(),
        amount,
        config.currency.clone(),
        due,
        ItemOrigin::TaxSettlement {
            config_id: config.id.clone(),
            window_start: window.start(),
        },
    )
    .with_label(format!("{} {}", config.label, window.label));
    vec![settlement]
}

/// Settlements of every configured tax whose payment date falls in `horizon`.
pub fn tax_settlements_for_horizon(
    actuals: &[ActualTransaction],
    horizon: &DateRange,
    configs: &[TaxConfig],
) -> Vec<ForecastItem> {
    configs
        .iter()
        .flat_map(|config| {
            windows_settled_in(config.periodicity, config.payment_delay_days, horizon)
                .into_iter()
                .flat_map(move |(window, _)| generate_tax_payment_entries(actuals, &window, config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actual::Payment;
    use crate::domain::common::Direction;
    use crate::domain::forecast::Schedule;
    use crate::domain::tax::DeclarationPeriodicity;
    use crate::taxes::declaration::get_declaration_periods;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settled(
        direction: SettlementDirection,
        category: &str,
        paid_on: NaiveDate,
        amount: Decimal,
    ) -> ActualTransaction {
        let mut actual = ActualTransaction::new(direction, category, paid_on, amount).unwrap();
        actual
            .record_payment(Payment::new(paid_on, amount, Uuid::new_v4()))
            .unwrap();
        actual
    }

    fn actuals() -> Vec<ActualTransaction> {
        vec![
            settled(
                SettlementDirection::Receivable,
                "Sales",
                date(2024, 2, 10),
                dec!(10000),
            ),
            settled(
                SettlementDirection::Payable,
                "Supplies",
                date(2024, 3, 5),
                dec!(4000),
            ),
            settled(
                SettlementDirection::Receivable,
                "Sales",
                date(2024, 4, 2),
                dec!(999),
            ),
        ]
    }

    #[test]
    fn revenue_basis_uses_receipts_only() {
        let config = TaxConfig::new(
            "turnover",
            "Turnover tax",
            dec!(0.022),
            TaxBase::Revenue,
            DeclarationPeriodicity::Quarterly,
        )
        .with_payment_delay(30);
        let q1 = &get_declaration_periods(2024, DeclarationPeriodicity::Quarterly)[0];
        let entries = generate_tax_payment_entries(&actuals(), q1, &config);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, dec!(220));
        assert_eq!(entries[0].direction, Direction::Expense);
        assert_eq!(entries[0].schedule, Schedule::one_off(date(2024, 5, 1)));
        assert_eq!(entries[0].label, "Turnover tax Q1 '24");
    }

    #[test]
    fn profit_basis_nets_disbursements_and_floors_at_zero() {
        let config = TaxConfig::new(
            "corporate",
            "Corporate tax",
            dec!(0.25),
            TaxBase::Profit,
            DeclarationPeriodicity::Quarterly,
        );
        let windows = get_declaration_periods(2024, DeclarationPeriodicity::Quarterly);
        let entries = generate_tax_payment_entries(&actuals(), &windows[0], &config);
        assert_eq!(entries[0].amount, dec!(1500));

        let mut losses = actuals();
        losses.push(settled(
            SettlementDirection::Payable,
            "Payroll",
            date(2024, 1, 31),
            dec!(20000),
        ));
        assert!(generate_tax_payment_entries(&losses, &windows[0], &config).is_empty());
    }

    #[test]
    fn category_filter_restricts_the_base() {
        let config = TaxConfig::new(
            "sales-only",
            "Levy",
            dec!(0.1),
            TaxBase::Profit,
            DeclarationPeriodicity::Annual,
        )
        .with_categories(vec!["Sales".into()]);
        let year = DateRange::new(date(2024, 1, 1), date(2025, 1, 1)).unwrap();
        assert_eq!(tax_base_for_window(&actuals(), &year, &config), dec!(10999));
    }

    #[test]
    fn horizon_enumerates_each_config() {
        let monthly = TaxConfig::new(
            "m",
            "Monthly levy",
            dec!(0.01),
            TaxBase::Revenue,
            DeclarationPeriodicity::Monthly,
        );
        let horizon = DateRange::new(date(2024, 1, 1), date(2024, 7, 1)).unwrap();
        let settlements = tax_settlements_for_horizon(&actuals(), &horizon, &[monthly]);
        let due: Vec<_> = settlements
            .iter()
            .map(|item| match item.schedule {
                Schedule::OneOff { date } => date,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(due, vec![date(2024, 3, 1), date(2024, 5, 1)]);
        assert!(tax_settlements_for_horizon(&actuals(), &horizon, &[]).is_empty());
    }
}
