use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

/// Inclusive calendar date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range from two endpoints in any order; inverted pairs are swapped.
    #[must_use]
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Strict constructor used for catalog data, where an inverted pair is malformed.
    pub fn ordered(start: NaiveDate, end: NaiveDate) -> ReportResult<Self> {
        if start > end {
            return Err(ReportError::InvalidData(format!(
                "range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// January 1st through December 31st of `year`.
    pub fn full_year(year: i32) -> ReportResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ReportError::InvalidFilter(format!("year {year} is out of range")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| ReportError::InvalidFilter(format!("year {year} is out of range")))?;
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered, both endpoints included.
    #[must_use]
    pub fn len_days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Moves both endpoints into `year`, keeping month and day.
    ///
    /// February 29th clamps to the 28th in non-leap years. Endpoints that
    /// spanned a year boundary may invert, so the result is re-normalized.
    pub fn reanchored_to_year(self, year: i32) -> ReportResult<Self> {
        let start = move_to_year(self.start, year)?;
        let end = move_to_year(self.end, year)?;
        Ok(Self::new(start, end))
    }
}

fn move_to_year(date: NaiveDate, year: i32) -> ReportResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .ok_or_else(|| ReportError::InvalidFilter(format!("year {year} is out of range")))
}

/// Parses the leading `YYYY-MM-DD` part of a date or datetime string.
///
/// Returns `None` when the prefix is missing or not a real calendar day.
#[must_use]
pub fn parse_date_prefix(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    let prefix = trimmed.get(..10)?;
    if let Some(rest) = trimmed.get(10..) {
        if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
            return None;
        }
    }
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Formats a date the way the navigable address carries it.
#[must_use]
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

const FRENCH_MONTHS: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

/// Abbreviated French month name, `month` in `1..=12`.
#[must_use]
pub fn french_month_abbrev(month: u32) -> &'static str {
    let index = month.clamp(1, 12) as usize - 1;
    FRENCH_MONTHS[index]
}

/// `01 juil. 2024`
#[must_use]
pub fn format_french_short_date(date: NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        french_month_abbrev(date.month()),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DateRange, parse_date_prefix};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_swaps_inverted_endpoints() {
        let range = DateRange::new(day(2024, 7, 15), day(2024, 7, 1));
        assert_eq!(range.start(), day(2024, 7, 1));
        assert_eq!(range.end(), day(2024, 7, 15));
        assert_eq!(range.len_days(), 15);
    }

    #[test]
    fn ordered_rejects_inverted_endpoints() {
        assert!(DateRange::ordered(day(2024, 7, 15), day(2024, 7, 1)).is_err());
    }

    #[test]
    fn reanchor_clamps_leap_day() {
        let range = DateRange::new(day(2024, 2, 29), day(2024, 3, 10));
        let moved = range.reanchored_to_year(2023).expect("reanchor");
        assert_eq!(moved.start(), day(2023, 2, 28));
        assert_eq!(moved.end(), day(2023, 3, 10));
    }

    #[test]
    fn reanchor_renormalizes_ranges_crossing_new_year() {
        let range = DateRange::new(day(2023, 12, 20), day(2024, 1, 5));
        let moved = range.reanchored_to_year(2024).expect("reanchor");
        assert_eq!(moved.start(), day(2024, 1, 5));
        assert_eq!(moved.end(), day(2024, 12, 20));
    }

    #[test]
    fn date_prefix_accepts_sql_datetimes_and_rejects_garbage() {
        assert_eq!(parse_date_prefix("2024-07-01"), Some(day(2024, 7, 1)));
        assert_eq!(
            parse_date_prefix("2024-07-01 00:00:00"),
            Some(day(2024, 7, 1))
        );
        assert_eq!(parse_date_prefix("2024-02-30"), None);
        assert_eq!(parse_date_prefix("01/07/2024"), None);
        assert_eq!(parse_date_prefix("2024-07-01x"), None);
        assert_eq!(parse_date_prefix(""), None);
    }
}
