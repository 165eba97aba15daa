//! Merge the three input tables into one visit-level dataset

use super::require_columns;
use crate::loader::RawTable;
use crate::Result;
use clinic_core::MergeKeys;
use polars::prelude::*;
use tracing::{debug, warn};

/// One row per visit, times the matching metric rows (at least one)
pub type MergedDataset = DataFrame;

const VISIT_ROW: &str = "__visit_row";
const METRIC_ROW: &str = "__metric_row";

/// Left-join visits to patients on identity, then to metrics on identity and date
///
/// Every visit row survives. A visit with several metric rows on the same date
/// fans out into adjacent rows, in metric order. Null keys never match.
///
/// A non-key column present on both sides of a join appears once in the result.
/// The joined-in file's copy is kept only when its schema declares the column,
/// so an undeclared extra column never shadows a declared attribute.
pub fn merge(
    patients: &RawTable,
    visits: &RawTable,
    metrics: &RawTable,
    keys: &MergeKeys,
) -> Result<MergedDataset> {
    let identity = keys.identity.as_str();
    let visit_date = keys.visit_date.as_str();
    let metric_date = keys.metric_date.as_str();
    require_columns(patients.frame(), &[identity])?;
    require_columns(visits.frame(), &[identity, visit_date])?;
    require_columns(metrics.frame(), &[identity, metric_date])?;

    let (visits_df, patients_df) = resolve_clashes(
        visits.frame().clone(),
        patients,
        &[identity],
        &[identity],
    )?;
    let with_patients = visits_df
        .with_row_index(PlSmallStr::from(VISIT_ROW), None)?
        .lazy()
        .join(
            patients_df.lazy(),
            [col(identity)],
            [col(identity)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    let (with_patients, metrics_df) = resolve_clashes(
        with_patients,
        metrics,
        &[identity, visit_date],
        &[identity, metric_date],
    )?;
    let merged = with_patients
        .lazy()
        .join(
            metrics_df
                .with_row_index(PlSmallStr::from(METRIC_ROW), None)?
                .lazy(),
            [col(identity), col(visit_date)],
            [col(identity), col(metric_date)],
            JoinArgs::new(JoinType::Left),
        )
        .sort_by_exprs(
            [col(VISIT_ROW), col(METRIC_ROW)],
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )
        .collect()?;

    let merged = merged.drop(VISIT_ROW)?.drop(METRIC_ROW)?;
    debug!(
        visits = visits.height(),
        rows = merged.height(),
        columns = merged.width(),
        "Merged dataset"
    );
    Ok(merged)
}

/// Leave exactly one copy of each column `left` and `right` share
///
/// A column keyed on both sides is left to the join. A join key on one side
/// keeps that side's copy. Otherwise `right` wins only if it declares the column.
fn resolve_clashes(
    mut left: DataFrame,
    right: &RawTable,
    left_keys: &[&str],
    right_keys: &[&str],
) -> Result<(DataFrame, DataFrame)> {
    let mut right_df = right.frame().clone();
    let shared: Vec<String> = left
        .get_column_names()
        .into_iter()
        .filter(|name| right_df.column(name.as_str()).is_ok())
        .map(|name| name.to_string())
        .collect();

    for name in &shared {
        let name = name.as_str();
        let left_key = left_keys.contains(&name);
        let right_key = right_keys.contains(&name);
        if left_key && right_key {
            continue;
        }
        if !left_key && (right_key || right.is_declared(name)) {
            warn!(column = name, kept = %right.role(), "Dropping shadowed column before merge");
            left = left.drop(name)?;
        } else {
            warn!(column = name, dropped = %right.role(), "Dropping shadowed column before merge");
            right_df = right_df.drop(name)?;
        }
    }
    Ok((left, right_df))
}
