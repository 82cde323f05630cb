use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: TimeUnit,
}

impl TimeInterval {
    /// Moves `steps` whole intervals away from `from`, always measured from
    /// `from` itself so month-end clamping never accumulates
    /// (Jan 31 → Feb 29 → Mar 31).
    pub fn add_steps(&self, from: NaiveDate, steps: i64) -> Option<NaiveDate> {
        let every = i64::from(self.every.max(1));
        match self.unit {
            TimeUnit::Day => shift_days(from, steps * every),
            TimeUnit::Week => shift_days(from, steps * every * 7),
            TimeUnit::Month => shift_month(from, steps * every),
            TimeUnit::Year => shift_month(from, steps * every * 12),
        }
    }

    /// Largest `k` such that `add_steps(anchor, k) <= date`.
    pub fn steps_until(&self, anchor: NaiveDate, date: NaiveDate) -> i64 {
        let every = i64::from(self.every.max(1));
        let mut steps = match self.unit {
            TimeUnit::Day => (date - anchor).num_days().div_euclid(every),
            TimeUnit::Week => (date - anchor).num_days().div_euclid(every * 7),
            TimeUnit::Month => month_index(date)
                .saturating_sub(month_index(anchor))
                .div_euclid(every),
            TimeUnit::Year => month_index(date)
                .saturating_sub(month_index(anchor))
                .div_euclid(every * 12),
        };
        while self
            .add_steps(anchor, steps)
            .is_some_and(|candidate| candidate > date)
        {
            steps -= 1;
        }
        steps
    }
}

pub(crate) fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Shifts by whole months, clamping the day to the target month's length.
pub(crate) fn shift_month(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    }
}

pub(crate) fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}
