//! Dataset operations: merge, date filter, aggregation and group comparison

pub mod aggregate;
pub mod compare;
pub mod filter;
pub mod merge;

use crate::{Error, Result};
use polars::prelude::*;

/// Fail with `InvalidColumn` unless `df` has every column in `names`
pub(crate) fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    for name in names {
        if df.column(name).is_err() {
            return Err(Error::InvalidColumn((*name).to_string()));
        }
    }
    Ok(())
}

/// Values of a column as `f64`, null where absent or not numeric
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| Error::InvalidColumn(name.to_string()))?;
    let values = column.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Values of a column as trimmed strings, null where absent or blank
pub(crate) fn label_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| Error::InvalidColumn(name.to_string()))?;
    let labels = column.cast(&DataType::String)?;
    Ok(labels
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}
