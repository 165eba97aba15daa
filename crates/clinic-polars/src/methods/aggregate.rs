//! Named aggregates over the filtered dataset

use super::{label_values, numeric_values, require_columns};
use crate::{Error, Result};
use clinic_core::{AggregateKind, AggregateSpec};
use clinic_stats::{complete_pairs, pearson};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// One computed aggregate table
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub name: String,
    pub kind: AggregateKind,
    /// `[group, value]` for group aggregates, `[x, y, n, r]` for correlations
    pub frame: DataFrame,
}

impl AggregateResult {
    /// Group labels in output order; empty for correlations
    pub fn group_keys(&self) -> Result<Vec<String>> {
        if matches!(self.kind, AggregateKind::Correlation { .. }) {
            return Ok(Vec::new());
        }
        let groups = self.frame.get_columns()[0].str()?;
        Ok(groups.into_iter().flatten().map(str::to_string).collect())
    }

    /// Aggregated value for `group`, `None` if the group is absent
    pub fn value_of(&self, group: &str) -> Result<Option<f64>> {
        let keys = self.group_keys()?;
        let Some(idx) = keys.iter().position(|k| k == group) else {
            return Ok(None);
        };
        let values = self.frame.get_columns()[1].cast(&DataType::Float64)?;
        Ok(values.f64()?.get(idx))
    }

    /// Pearson coefficient of a correlation aggregate
    pub fn pearson_r(&self) -> Result<Option<f64>> {
        match self.kind {
            AggregateKind::Correlation { .. } => {
                let r = &self.frame.get_columns()[3];
                Ok(r.f64()?.get(0))
            }
            _ => Err(Error::InvalidColumn(format!(
                "{} is not a correlation aggregate",
                self.name
            ))),
        }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Compute every aggregate in `specs`, keyed by aggregate name
#[instrument(skip_all, fields(rows = df.height(), aggregates = specs.len()))]
pub fn aggregate(df: &DataFrame, specs: &[AggregateSpec]) -> Result<BTreeMap<String, AggregateResult>> {
    let mut results = BTreeMap::new();
    for spec in specs {
        require_columns(df, &spec.kind.fields())?;
        let frame = match &spec.kind {
            AggregateKind::GroupMean { group_by, value } => {
                grouped(df, group_by, value, col(value.as_str()).mean(), spec.output_column())?
            }
            AggregateKind::GroupSum { group_by, value } => {
                grouped(df, group_by, value, col(value.as_str()).sum(), spec.output_column())?
            }
            AggregateKind::GroupCount { group_by } => group_count(df, group_by, spec.output_column())?,
            AggregateKind::Correlation { x, y } => correlation(df, x, y, spec.output_column())?,
        };
        debug!(name = %spec.name, kind = spec.kind.label(), rows = frame.height(), "Computed aggregate");
        results.insert(
            spec.name.clone(),
            AggregateResult {
                name: spec.name.clone(),
                kind: spec.kind.clone(),
                frame,
            },
        );
    }
    Ok(results)
}

fn grouped(df: &DataFrame, group_by: &str, value: &str, agg: Expr, output: &str) -> Result<DataFrame> {
    let frame = DataFrame::new(vec![
        Series::new(group_by.into(), label_values(df, group_by)?).into(),
        Series::new(value.into(), numeric_values(df, value)?).into(),
    ])?;
    Ok(frame
        .lazy()
        .filter(col(group_by).is_not_null().and(col(value).is_not_null()))
        .group_by_stable([col(group_by)])
        .agg([agg.alias(output)])
        .collect()?)
}

fn group_count(df: &DataFrame, group_by: &str, output: &str) -> Result<DataFrame> {
    let frame = DataFrame::new(vec![
        Series::new(group_by.into(), label_values(df, group_by)?).into(),
    ])?;
    Ok(frame
        .lazy()
        .filter(col(group_by).is_not_null())
        .group_by_stable([col(group_by)])
        .agg([len().cast(DataType::Int64).alias(output)])
        .collect()?)
}

fn correlation(df: &DataFrame, x: &str, y: &str, output: &str) -> Result<DataFrame> {
    let pairs = numeric_values(df, x)?
        .into_iter()
        .zip(numeric_values(df, y)?);
    let (xs, ys) = complete_pairs(pairs);
    let c = pearson(&xs, &ys)?;

    Ok(DataFrame::new(vec![
        Series::new("x".into(), [x]).into(),
        Series::new("y".into(), [y]).into(),
        Series::new("n".into(), [c.n as i64]).into(),
        Series::new(output.into(), [c.r]).into(),
    ])?)
}
