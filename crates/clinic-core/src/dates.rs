//! Date parsing and inclusive date ranges

use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Days between 0001-01-01 (CE day 1) and 1970-01-01
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Parse a calendar date from the formats clinic exports use
///
/// Date-time values are accepted and truncated to their calendar day.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Days since the Unix epoch, the physical representation of a date column
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS
}

/// Optional inclusive lower/upper bound on a calendar date
///
/// A missing bound places no constraint on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range with no bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a range from parsed bounds
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(Error::InvalidDateRange(format!(
                    "start {s} is after end {e}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// Parse bounds from user-supplied strings
    ///
    /// `None` and blank strings mean no bound. Anything else must parse as a
    /// date, otherwise `InvalidDateRange` is returned.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Self::new(parse_bound(start, "start")?, parse_bound(end, "end")?)
    }

    /// Whether neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `date` lies within the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Bounds as days since the Unix epoch
    pub fn epoch_bounds(&self) -> (Option<i32>, Option<i32>) {
        (
            self.start.map(days_since_epoch),
            self.end.map(days_since_epoch),
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => f.write_str("[unbounded]"),
            (Some(s), None) => write!(f, "[{s}, ..]"),
            (None, Some(e)) => write!(f, "[.., {e}]"),
            (Some(s), Some(e)) => write!(f, "[{s}, {e}]"),
        }
    }
}

fn parse_bound(raw: Option<&str>, side: &str) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some).ok_or_else(|| {
            Error::InvalidDateRange(format!("cannot parse {side} bound '{value}'"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_supported_formats() {
        assert_eq!(parse_date("2024-01-10"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("2024/01/10"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("01/10/2024"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date(" 2024-01-10 08:30:00 "), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10T23:59:59"), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_epoch_days() {
        assert_eq!(days_since_epoch(ymd(1970, 1, 1)), 0);
        assert_eq!(days_since_epoch(ymd(1970, 1, 2)), 1);
        assert_eq!(days_since_epoch(ymd(1969, 12, 31)), -1);
    }

    #[test]
    fn test_range_parse_and_contains() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        assert!(range.contains(ymd(2024, 1, 1)));
        assert!(range.contains(ymd(2024, 1, 31)));
        assert!(!range.contains(ymd(2024, 2, 1)));
        assert!(!range.contains(ymd(2023, 12, 31)));
    }

    #[test]
    fn test_blank_bounds_are_absent() {
        let range = DateRange::parse(Some("  "), None).unwrap();
        assert!(range.is_unbounded());
        assert!(range.contains(ymd(1900, 1, 1)));
    }

    #[test]
    fn test_one_sided_range() {
        let range = DateRange::parse(None, Some("2024-02-01")).unwrap();
        assert!(range.contains(ymd(2000, 1, 1)));
        assert!(!range.contains(ymd(2024, 2, 2)));
        assert_eq!(range.to_string(), "[.., 2024-02-01]");
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            DateRange::parse(Some("not-a-date"), None),
            Err(Error::InvalidDateRange(_))
        ));
        assert!(matches!(
            DateRange::parse(Some("2024-03-01"), Some("2024-01-01")),
            Err(Error::InvalidDateRange(_))
        ));
    }
}
