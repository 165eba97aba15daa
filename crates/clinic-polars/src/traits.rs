//! DataFrame extension trait for clinic datasets

use crate::methods::aggregate::{aggregate, AggregateResult};
use crate::methods::compare::compare_groups;
use crate::methods::filter::filter_by_date;
use crate::Result;
use clinic_core::{normalize, AggregateSpec, ComparisonSpec, DateRange};
use clinic_stats::StatResult;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Dataset operations available directly on a Polars `DataFrame`
///
/// Column arguments are canonical names, as produced by the loader or by
/// [`ClinicFrameExt::canonicalize_columns`].
pub trait ClinicFrameExt {
    /// Rename every column to its canonical form
    fn canonicalize_columns(&mut self) -> Result<()>;

    /// Keep rows whose `date_column` lies within `range`
    fn filter_dates(&self, date_column: &str, range: &DateRange) -> Result<DataFrame>;

    /// Compute named aggregates
    fn clinic_aggregates(&self, specs: &[AggregateSpec]) -> Result<BTreeMap<String, AggregateResult>>;

    /// Welch's t-test between two labelled groups
    fn compare(&self, spec: &ComparisonSpec) -> Result<StatResult>;
}

impl ClinicFrameExt for DataFrame {
    fn canonicalize_columns(&mut self) -> Result<()> {
        let names: Vec<String> = self
            .get_column_names()
            .into_iter()
            .map(|name| normalize(name.as_str()))
            .collect();
        self.set_column_names(names)?;
        Ok(())
    }

    fn filter_dates(&self, date_column: &str, range: &DateRange) -> Result<DataFrame> {
        filter_by_date(self, date_column, range)
    }

    fn clinic_aggregates(&self, specs: &[AggregateSpec]) -> Result<BTreeMap<String, AggregateResult>> {
        aggregate(self, specs)
    }

    fn compare(&self, spec: &ComparisonSpec) -> Result<StatResult> {
        compare_groups(self, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_columns() {
        let mut df = df![
            "Patient ID" => ["1"],
            "Service_Charge" => [10.0],
        ]
        .unwrap();
        df.canonicalize_columns().unwrap();

        assert!(df.column("patientid").is_ok());
        assert!(df.column("servicecharge").is_ok());
    }
}
