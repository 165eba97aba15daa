//! Inclusive date-range filter

use super::require_columns;
use crate::Result;
use clinic_core::DateRange;
use polars::prelude::*;
use tracing::debug;

/// Keep rows whose `date_column` lies within `range`
///
/// Rows with a null date are kept only when the range is unbounded.
pub fn filter_by_date(df: &DataFrame, date_column: &str, range: &DateRange) -> Result<DataFrame> {
    require_columns(df, &[date_column])?;
    if range.is_unbounded() {
        return Ok(df.clone());
    }

    let days = col(date_column).cast(DataType::Int32);
    let predicate = match range.epoch_bounds() {
        (Some(lower), Some(upper)) => days.clone().gt_eq(lit(lower)).and(days.lt_eq(lit(upper))),
        (Some(lower), None) => days.gt_eq(lit(lower)),
        (None, Some(upper)) => days.lt_eq(lit(upper)),
        (None, None) => return Ok(df.clone()),
    };

    let filtered = df.clone().lazy().filter(predicate).collect()?;
    debug!(
        column = date_column,
        %range,
        before = df.height(),
        after = filtered.height(),
        "Applied date filter"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dated_frame() -> DataFrame {
        let days = Series::new(
            PlSmallStr::from("visitdate"),
            vec![Some(19_000), None, Some(19_010)],
        )
        .cast(&DataType::Date)
        .unwrap();
        DataFrame::new(vec![days.into()]).unwrap()
    }

    #[test]
    fn test_unbounded_keeps_null_dates() {
        let df = dated_frame();
        let out = filter_by_date(&df, "visitdate", &DateRange::unbounded()).unwrap();
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let df = dated_frame();
        let day = |n: i64| {
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(n)
        };
        let range = DateRange::new(Some(day(19_000)), Some(day(19_000))).unwrap();
        let out = filter_by_date(&df, "visitdate", &range).unwrap();
        assert_eq!(out.height(), 1);
    }
}
