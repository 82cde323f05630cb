//! Half-open date ranges and the labelled periods built from them.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// A half-open interval `[start, end)` of calendar days.
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// A labelled calendar bucket produced by the period generator.
pub struct Period {
    pub range: DateRange,
    pub label: String,
}

impl Period {
    pub(crate) fn new(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Self {
        Self {
            range: DateRange { start, end },
            label: label.into(),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range.contains(date)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
/// Calendar granularity used to bucket a projection horizon.
pub enum Granularity {
    Day,
    Week,
    Fortnight,
    #[default]
    Month,
    Quarter,
    Semester,
    Year,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Day => "Day",
            Granularity::Week => "Week",
            Granularity::Fortnight => "Fortnight",
            Granularity::Month => "Month",
            Granularity::Quarter => "Quarter",
            Granularity::Semester => "Semester",
            Granularity::Year => "Year",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_is_half_open() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));
        assert!(!range.contains(date(2023, 12, 31)));
    }

    #[test]
    fn range_rejects_reversed_bounds() {
        let err = DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeStart { .. }));
    }

    #[test]
    fn overlapping_ranges() {
        let jan = DateRange::new(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        let feb = DateRange::new(date(2024, 2, 1), date(2024, 3, 1)).unwrap();
        let mid = DateRange::new(date(2024, 1, 15), date(2024, 2, 15)).unwrap();
        assert!(!jan.overlaps(&feb));
        assert!(jan.overlaps(&mid));
        assert!(feb.overlaps(&mid));
    }
}
