//! Builds the ordered calendar periods a projection is bucketed into.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::period::{Granularity, Period};
use crate::ledger::time_interval::{first_of_month, shift_days, shift_month};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
/// Language used for period labels.
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    fn month(self, month: u32) -> &'static str {
        const EN: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        const FR: [&str; 12] = [
            "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.",
            "nov.", "déc.",
        ];
        let index = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::En => EN[index],
            Locale::Fr => FR[index],
        }
    }

    fn week_prefix(self) -> &'static str {
        match self {
            Locale::En => "W",
            Locale::Fr => "S",
        }
    }

    fn quarter_prefix(self) -> &'static str {
        match self {
            Locale::En => "Q",
            Locale::Fr => "T",
        }
    }

    fn semester_prefix(self) -> &'static str {
        match self {
            Locale::En => "H",
            Locale::Fr => "S",
        }
    }
}

/// Converts a UTC instant into the project's local calendar day.
pub fn local_today(today: DateTime<Utc>, timezone_offset: FixedOffset) -> NaiveDate {
    today.with_timezone(&timezone_offset).date_naive()
}

/// Generates `horizon_length` contiguous periods with English labels.
///
/// Period `i` starts `i + offset` steps after the anchor derived from the local
/// date; a non-positive horizon yields no periods.
pub fn generate_periods(
    granularity: Granularity,
    horizon_length: i32,
    offset: i32,
    timezone_offset: FixedOffset,
    today: DateTime<Utc>,
) -> Vec<Period> {
    generate_periods_localized(
        granularity,
        horizon_length,
        offset,
        timezone_offset,
        today,
        Locale::En,
    )
}

pub fn generate_periods_localized(
    granularity: Granularity,
    horizon_length: i32,
    offset: i32,
    timezone_offset: FixedOffset,
    today: DateTime<Utc>,
    locale: Locale,
) -> Vec<Period> {
    periods_from_date(
        granularity,
        horizon_length,
        offset,
        local_today(today, timezone_offset),
        locale,
    )
}

/// Same as [`generate_periods_localized`] with an already-localized day.
pub fn periods_from_date(
    granularity: Granularity,
    horizon_length: i32,
    offset: i32,
    local_day: NaiveDate,
    locale: Locale,
) -> Vec<Period> {
    if horizon_length <= 0 {
        return Vec::new();
    }
    let anchor = base_anchor(granularity, local_day);
    let mut periods = Vec::with_capacity(horizon_length as usize);
    for index in 0..i64::from(horizon_length) {
        let step = index + i64::from(offset);
        let (Some(start), Some(end)) = (
            step_from(granularity, anchor, step),
            step_from(granularity, anchor, step + 1),
        ) else {
            break;
        };
        let label = label_for(granularity, start, end, locale);
        periods.push(Period::new(start, end, label));
    }
    periods
}

/// Start of the period of `granularity` that contains `date`.
pub fn base_anchor(granularity: Granularity, date: NaiveDate) -> NaiveDate {
    let month_block = |months: u32| {
        let block = (date.month0() / months) * months;
        first_of_month(date.year(), block + 1).unwrap_or(date)
    };
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            let delta = i64::from(date.weekday().num_days_from_monday());
            shift_days(date, -delta).unwrap_or(date)
        }
        Granularity::Fortnight => {
            let day = if date.day() < 16 { 1 } else { 16 };
            date.with_day(day).unwrap_or(date)
        }
        Granularity::Month => month_block(1),
        Granularity::Quarter => month_block(3),
        Granularity::Semester => month_block(6),
        Granularity::Year => month_block(12),
    }
}

/// Moves `steps` periods away from an anchor produced by [`base_anchor`].
fn step_from(granularity: Granularity, anchor: NaiveDate, steps: i64) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => shift_days(anchor, steps),
        Granularity::Week => shift_days(anchor, steps * 7),
        Granularity::Fortnight => step_fortnight(anchor, steps),
        Granularity::Month => shift_month(anchor, steps),
        Granularity::Quarter => shift_month(anchor, steps * 3),
        Granularity::Semester => shift_month(anchor, steps * 6),
        Granularity::Year => shift_month(anchor, steps * 12),
    }
}

/// Half-months are numbered consecutively: 1st of a month is even, 16th odd.
fn step_fortnight(anchor: NaiveDate, steps: i64) -> Option<NaiveDate> {
    let half = if anchor.day() >= 16 { 1 } else { 0 };
    let index = (i64::from(anchor.year()) * 12 + i64::from(anchor.month0())) * 2 + half + steps;
    let month_index = index.div_euclid(2);
    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = u32::try_from(month_index.rem_euclid(12)).ok()? + 1;
    let day = if index.rem_euclid(2) == 0 { 1 } else { 16 };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn short_year(year: i32) -> String {
    format!("'{:02}", year.rem_euclid(100))
}

fn label_for(granularity: Granularity, start: NaiveDate, end: NaiveDate, locale: Locale) -> String {
    let month = locale.month(start.month());
    let year = short_year(start.year());
    match granularity {
        Granularity::Day => format!("{} {} {}", start.day(), month, year),
        Granularity::Week => {
            let iso = start.iso_week();
            format!(
                "{}{:02} {}",
                locale.week_prefix(),
                iso.week(),
                short_year(iso.year())
            )
        }
        Granularity::Fortnight => {
            let last_day = end.pred_opt().map(|day| day.day()).unwrap_or(start.day());
            format!("{}-{} {} {}", start.day(), last_day, month, year)
        }
        Granularity::Month => format!("{} {}", month, year),
        Granularity::Quarter => {
            format!("{}{} {}", locale.quarter_prefix(), start.month0() / 3 + 1, year)
        }
        Granularity::Semester => {
            format!("{}{} {}", locale.semester_prefix(), start.month0() / 6 + 1, year)
        }
        Granularity::Year => start.year().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn labels(periods: &[Period]) -> String {
        periods
            .iter()
            .map(|period| period.label.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    const ALL: [Granularity; 7] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Fortnight,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Semester,
        Granularity::Year,
    ];

    #[test]
    fn every_granularity_yields_contiguous_periods() {
        let today = date(2024, 2, 15);
        for granularity in ALL {
            for offset in [-3, 0, 5] {
                let periods = periods_from_date(granularity, 30, offset, today, Locale::En);
                assert_eq!(periods.len(), 30, "{granularity}");
                for pair in periods.windows(2) {
                    assert_eq!(pair[0].end(), pair[1].start(), "{granularity} gap");
                    assert!(pair[0].start() < pair[0].end(), "{granularity} empty");
                }
            }
        }
    }

    #[test]
    fn labels_are_unique_within_a_horizon() {
        let today = date(2024, 11, 20);
        for granularity in ALL {
            let periods = periods_from_date(granularity, 40, -10, today, Locale::En);
            let mut seen = std::collections::HashSet::new();
            for period in &periods {
                assert!(seen.insert(period.label.clone()), "duplicate {}", period.label);
            }
        }
    }

    #[test]
    fn non_positive_horizon_is_empty() {
        let today = date(2024, 2, 15);
        assert!(periods_from_date(Granularity::Month, 0, 0, today, Locale::En).is_empty());
        assert!(periods_from_date(Granularity::Month, -4, 0, today, Locale::En).is_empty());
    }

    #[test]
    fn monthly_periods_start_at_current_month() {
        let periods = periods_from_date(Granularity::Month, 3, 0, date(2024, 2, 15), Locale::En);
        assert_eq!(periods[0].start(), date(2024, 2, 1));
        assert_eq!(periods[2].end(), date(2024, 5, 1));
        assert_snapshot!(labels(&periods), @"Feb '24 | Mar '24 | Apr '24");
    }

    #[test]
    fn fortnights_roll_over_months_and_years() {
        let periods =
            periods_from_date(Granularity::Fortnight, 4, 0, date(2024, 12, 20), Locale::En);
        assert_eq!(periods[0].start(), date(2024, 12, 16));
        assert_eq!(periods[1].start(), date(2025, 1, 1));
        assert_eq!(periods[2].start(), date(2025, 1, 16));
        assert_eq!(periods[3].end(), date(2025, 2, 16));
        assert_snapshot!(
            labels(&periods),
            @"16-31 Dec '24 | 1-15 Jan '25 | 16-31 Jan '25 | 1-15 Feb '25"
        );
    }

    #[test]
    fn fortnight_negative_offset_steps_back() {
        let periods =
            periods_from_date(Granularity::Fortnight, 2, -3, date(2024, 1, 5), Locale::En);
        assert_eq!(periods[0].start(), date(2023, 11, 16));
        assert_eq!(periods[1].start(), date(2023, 12, 1));
    }

    #[test]
    fn weeks_start_on_monday() {
        let periods = periods_from_date(Granularity::Week, 2, 0, date(2024, 12, 31), Locale::En);
        assert_eq!(periods[0].start(), date(2024, 12, 30));
        assert_snapshot!(labels(&periods), @"W01 '25 | W02 '25");
    }

    #[test]
    fn quarter_semester_and_year_labels() {
        let today = date(2024, 5, 10);
        assert_snapshot!(
            labels(&periods_from_date(Granularity::Quarter, 4, 0, today, Locale::En)),
            @"Q2 '24 | Q3 '24 | Q4 '24 | Q1 '25"
        );
        assert_snapshot!(
            labels(&periods_from_date(Granularity::Semester, 2, 0, today, Locale::Fr)),
            @"S1 '24 | S2 '24"
        );
        assert_snapshot!(
            labels(&periods_from_date(Granularity::Year, 2, -1, today, Locale::En)),
            @"2023 | 2024"
        );
    }

    #[test]
    fn french_month_labels() {
        let periods = periods_from_date(Granularity::Month, 2, 0, date(2024, 7, 1), Locale::Fr);
        assert_snapshot!(labels(&periods), @"juil. '24 | août '24");
    }

    #[test]
    fn timezone_offset_moves_the_local_day() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();
        let paris = FixedOffset::east_opt(3600).unwrap();
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();

        let ahead = generate_periods(Granularity::Month, 1, 0, paris, instant);
        assert_eq!(ahead[0].start(), date(2024, 2, 1));

        let behind = generate_periods(Granularity::Month, 1, 0, new_york, instant);
        assert_eq!(behind[0].start(), date(2024, 1, 1));
    }
}
