//! Declaration windows shared by the VAT and tax settlement generators.

use chrono::{Datelike, NaiveDate};

use crate::domain::period::{DateRange, Granularity, Period};
use crate::domain::tax::DeclarationPeriodicity;
use crate::ledger::periods::{periods_from_date, Locale};
use crate::ledger::time_interval::shift_days;

fn granularity_for(periodicity: DeclarationPeriodicity) -> Granularity {
    match periodicity {
        DeclarationPeriodicity::Monthly => Granularity::Month,
        DeclarationPeriodicity::Quarterly => Granularity::Quarter,
        DeclarationPeriodicity::Semiannual => Granularity::Semester,
        DeclarationPeriodicity::Annual => Granularity::Year,
    }
}

/// Non-overlapping windows covering calendar `year` exactly.
pub fn get_declaration_periods(year: i32, periodicity: DeclarationPeriodicity) -> Vec<Period> {
    let Some(january) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };
    let count = (12 / periodicity.months()) as i32;
    periods_from_date(granularity_for(periodicity), count, 0, january, Locale::En)
}

/// Date a window is settled on: its exclusive end plus the payment delay.
pub fn settlement_date(window: &Period, payment_delay_days: u32) -> Option<NaiveDate> {
    shift_days(window.end(), i64::from(payment_delay_days))
}

/// Declaration windows whose settlement date falls inside `horizon`, in order.
///
/// Only the calendar years that can produce such a settlement are expanded.
pub fn windows_settled_in(
    periodicity: DeclarationPeriodicity,
    payment_delay_days: u32,
    horizon: &DateRange,
) -> Vec<(Period, NaiveDate)> {
    if horizon.is_empty() {
        return Vec::new();
    }
    let delay = i64::from(payment_delay_days);
    let earliest_end = shift_days(horizon.start, -delay).unwrap_or(horizon.start);
    let first_year = earliest_end.year() - 1;
    let last_year = horizon.end.year();

    (first_year..=last_year)
        .flat_map(|year| get_declaration_periods(year, periodicity))
        .filter_map(|window| {
            let settles_on = settlement_date(&window, payment_delay_days)?;
            horizon
                .contains(settles_on)
                .then_some((window, settles_on))
        })
        .collect()
}
