//! Evaluates how much a forecast item budgets, or has realized, within a date range.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::domain::actual::ActualTransaction;
use crate::domain::common::MONEY_SCALE;
use crate::domain::forecast::{Cadence, ForecastItem, Installment, Schedule};
use crate::domain::period::DateRange;
use crate::ledger::time_interval::shift_month;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A dated cash movement implied by a forecast item.
pub struct Occurrence {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Budgeted occurrences of `item` that fall inside `range`, in date order.
///
/// A provisioned item yields a single occurrence carrying its whole amount at
/// the final payment date; its own schedule is not walked.
pub fn occurrences_in_range(item: &ForecastItem, range: &DateRange) -> Vec<Occurrence> {
    if range.is_empty() {
        return Vec::new();
    }
    if let Some(provisioning) = &item.provisioning {
        let date = provisioning.final_payment_date;
        return if range.contains(date) {
            vec![Occurrence {
                date,
                amount: item.amount,
            }]
        } else {
            Vec::new()
        };
    }
    match &item.schedule {
        Schedule::OneOff { date } if range.contains(*date) => vec![Occurrence {
            date: *date,
            amount: item.amount,
        }],
        Schedule::OneOff { .. } => Vec::new(),
        Schedule::Periodic {
            cadence,
            start,
            end,
        } => {
            if let Some(end) = end.filter(|end| end < start) {
                warn!(
                    item_id = %item.id,
                    %start,
                    %end,
                    "periodic item ends before it starts; contributing nothing"
                );
                return Vec::new();
            }
            periodic_occurrences(*cadence, *start, *end, item.amount, range)
        }
        Schedule::Irregular { installments } => installments
            .iter()
            .filter(|installment| range.contains(installment.date))
            .map(|installment| Occurrence {
                date: installment.date,
                amount: installment.amount,
            })
            .collect(),
    }
}

/// Walks only the occurrences that can intersect `range`; occurrence `k` is
/// always computed from `start`, so month-end clamping never drifts.
fn periodic_occurrences(
    cadence: Cadence,
    start: NaiveDate,
    end: Option<NaiveDate>,
    amount: Decimal,
    range: &DateRange,
) -> Vec<Occurrence> {
    let interval = cadence.interval();
    let mut step = interval.steps_until(start, range.start).max(0);
    if interval
        .add_steps(start, step)
        .is_some_and(|date| date < range.start)
    {
        step += 1;
    }

    let mut occurrences = Vec::new();
    while let Some(date) = interval.add_steps(start, step) {
        if date >= range.end || end.is_some_and(|end| date > end) {
            break;
        }
        occurrences.push(Occurrence { date, amount });
        step += 1;
    }
    occurrences
}

/// Unsigned budgeted amount of `item` within `range`.
pub fn budgeted_amount_in_range(item: &ForecastItem, range: &DateRange) -> Decimal {
    occurrences_in_range(item, range)
        .iter()
        .map(|occurrence| occurrence.amount)
        .sum()
}

/// Budgeted amount with the cash sign applied (revenue positive).
pub fn signed_budgeted_amount_in_range(item: &ForecastItem, range: &DateRange) -> Decimal {
    item.direction.signed(budgeted_amount_in_range(item, range))
}

/// Unsigned sum of the payments recorded against `item` within `range`.
pub fn actual_amount_in_range(
    item: &ForecastItem,
    actuals: &[ActualTransaction],
    range: &DateRange,
) -> Decimal {
    children_of(item, actuals)
        .flat_map(|actual| actual.payments.iter())
        .filter(|payment| range.contains(payment.payment_date))
        .map(|payment| payment.paid_amount)
        .sum()
}

/// Realized amount with each actual's settlement sign (receivable positive).
pub fn signed_actual_amount_in_range(
    item: &ForecastItem,
    actuals: &[ActualTransaction],
    range: &DateRange,
) -> Decimal {
    children_of(item, actuals)
        .map(|actual| {
            let paid: Decimal = actual
                .payments
                .iter()
                .filter(|payment| range.contains(payment.payment_date))
                .map(|payment| payment.paid_amount)
                .sum();
            actual.direction.signed(paid)
        })
        .sum()
}

/// Smoothed display plan for a provisioned item: equal monthly installments
/// ending at the final payment date, with the rounding remainder on the last.
pub fn provision_installments(item: &ForecastItem) -> Vec<Installment> {
    let Some(provisioning) = &item.provisioning else {
        return Vec::new();
    };
    let count = provisioning.installment_count(item.frequency()).max(1);
    let share = (item.amount / Decimal::from(count))
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
    let last_share = item.amount - share * Decimal::from(count - 1);

    let final_date = provisioning.final_payment_date;
    (0..count)
        .filter_map(|index| {
            let months_before = i64::from(count - 1 - index);
            let date = shift_month(final_date, -months_before)?;
            let amount = if index + 1 == count { last_share } else { share };
            Some(Installment::new(date, amount))
        })
        .collect()
}

/// Provision payments already made against `item` strictly before `date`.
pub fn provisioned_amount_before(
    item: &ForecastItem,
    actuals: &[ActualTransaction],
    date: NaiveDate,
) -> Decimal {
    children_of(item, actuals)
        .filter(|actual| actual.is_provision)
        .flat_map(|actual| actual.payments.iter())
        .filter(|payment| payment.payment_date < date)
        .map(|payment| payment.paid_amount)
        .sum()
}

fn children_of<'a>(
    item: &'a ForecastItem,
    actuals: &'a [ActualTransaction],
) -> impl Iterator<Item = &'a ActualTransaction> + 'a {
    actuals
        .iter()
        .filter(move |actual| actual.parent_id == Some(item.id))
}
