//! Two-group comparisons on the filtered dataset

use super::{label_values, numeric_values};
use crate::Result;
use clinic_core::{normalize, ComparisonSpec};
use clinic_stats::{StatResult, WelchTTest};
use polars::prelude::*;
use tracing::debug;

/// Run Welch's t-test on `value_field` between the two labelled groups
///
/// Group labels match after normalization on both sides, so "Blue Cross"
/// selects rows labelled "BlueCross". Null values are skipped.
pub fn compare_groups(df: &DataFrame, spec: &ComparisonSpec) -> Result<StatResult> {
    let (a, b) = split_groups(df, spec)?;
    let result = WelchTTest::new().test(&a, &b)?;
    debug!(
        name = %spec.name,
        n_a = a.len(),
        n_b = b.len(),
        statistic = ?result.statistic(),
        "Compared groups"
    );
    Ok(result)
}

/// Non-null values of `value_field` for `group_a` and `group_b`
pub fn split_groups(df: &DataFrame, spec: &ComparisonSpec) -> Result<(Vec<f64>, Vec<f64>)> {
    let labels = label_values(df, &spec.group_field)?;
    let values = numeric_values(df, &spec.value_field)?;
    let want_a = normalize(&spec.group_a);
    let want_b = normalize(&spec.group_b);

    let mut a = Vec::new();
    let mut b = Vec::new();
    for (label, value) in labels.iter().zip(values) {
        let (Some(label), Some(value)) = (label, value) else {
            continue;
        };
        let label = normalize(label);
        if label == want_a {
            a.push(value);
        } else if label == want_b {
            b.push(value);
        }
    }
    Ok((a, b))
}
