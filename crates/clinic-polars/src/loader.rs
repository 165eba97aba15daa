//! CSV ingestion into typed DataFrames
//!
//! Headers are canonicalized, validated against the analysis schema, and each
//! column is typed by its declared kind. A malformed date aborts the whole load.

use crate::{Error, Result};
use clinic_core::{
    days_since_epoch, normalize, parse_date, AnalysisDefinition, ColumnKind, ColumnSpec,
    FileRole,
};
use polars::prelude::*;
use tracing::{debug, instrument, warn};

/// One loaded input file, with canonical column names
#[derive(Debug, Clone)]
pub struct RawTable {
    role: FileRole,
    frame: DataFrame,
    /// Canonical names the schema requires of this file
    declared: Vec<String>,
}

impl RawTable {
    /// Wrap an already-typed frame with no declared columns
    pub fn new(role: FileRole, frame: DataFrame) -> Self {
        Self {
            role,
            frame,
            declared: Vec::new(),
        }
    }

    /// Mark `names` as declared by the schema for this file
    pub fn with_declared<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn role(&self) -> FileRole {
        self.role
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn declared(&self) -> &[String] {
        &self.declared
    }

    /// Whether `name` is a declared column rather than an extra one
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|d| d == name)
    }

    /// Number of data rows
    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Load one role's CSV bytes according to `definition`
///
/// Fails with `MissingColumns` (every absent column listed) before any cell is
/// parsed, and with `MalformedDate` on the first unparseable date cell.
#[instrument(skip(definition, bytes), fields(analysis = %definition.key, role = %role, bytes = bytes.len()))]
pub fn load_table(definition: &AnalysisDefinition, role: FileRole, bytes: &[u8]) -> Result<RawTable> {
    let schema = definition.schema(role).ok_or_else(|| {
        clinic_core::Error::invalid_definition(&definition.key, format!("no schema for {role}"))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|source| Error::Csv { role, source })?
        .clone();

    // (position in record, canonical name), first occurrence wins
    let mut kept: Vec<(usize, String)> = Vec::with_capacity(headers.len());
    for (idx, raw) in headers.iter().enumerate() {
        let canonical = normalize(raw.trim_start_matches('\u{feff}'));
        if canonical.is_empty() {
            warn!(%role, position = idx, "Dropping column with blank header");
            continue;
        }
        if kept.iter().any(|(_, name)| *name == canonical) {
            warn!(%role, header = raw, canonical = %canonical, "Dropping duplicate column");
            continue;
        }
        kept.push((idx, canonical));
    }

    let names: Vec<&str> = kept.iter().map(|(_, name)| name.as_str()).collect();
    schema.validate_headers(role, &names)?;

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); kept.len()];
    for record in reader.records() {
        let record = record.map_err(|source| Error::Csv { role, source })?;
        for (slot, (idx, _)) in cells.iter_mut().zip(&kept) {
            slot.push(
                record
                    .get(*idx)
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string),
            );
        }
    }

    let mut columns = Vec::with_capacity(kept.len());
    for ((_, name), values) in kept.iter().zip(cells) {
        let kind = schema.kind_of(name).unwrap_or_default();
        columns.push(typed_column(role, name, kind, values)?);
    }

    let frame = DataFrame::new(columns)?;
    debug!(%role, rows = frame.height(), columns = frame.width(), "Loaded table");
    Ok(RawTable::new(role, frame)
        .with_declared(schema.required_columns.iter().map(ColumnSpec::canonical)))
}

fn typed_column(
    role: FileRole,
    name: &str,
    kind: ColumnKind,
    values: Vec<Option<String>>,
) -> Result<Column> {
    let series = match kind {
        ColumnKind::Key | ColumnKind::Text => Series::new(name.into(), values),
        ColumnKind::Numeric => {
            let parsed: Vec<Option<f64>> = values
                .iter()
                .map(|v| {
                    v.as_deref()
                        .and_then(|s| s.parse::<f64>().ok())
                        .filter(|n| n.is_finite())
                })
                .collect();
            let rejected = values
                .iter()
                .zip(&parsed)
                .filter(|(raw, num)| raw.is_some() && num.is_none())
                .count();
            if rejected > 0 {
                debug!(%role, column = name, rejected, "Non-numeric cells loaded as null");
            }
            Series::new(name.into(), parsed)
        }
        ColumnKind::Date => {
            let mut days: Vec<Option<i32>> = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    None => days.push(None),
                    Some(raw) => match parse_date(&raw) {
                        Some(date) => days.push(Some(days_since_epoch(date))),
                        None => {
                            return Err(clinic_core::Error::MalformedDate {
                                role,
                                column: name.to_string(),
                                value: raw,
                            }
                            .into())
                        }
                    },
                }
            }
            Series::new(name.into(), days).cast(&DataType::Date)?
        }
    };
    Ok(series.into())
}
