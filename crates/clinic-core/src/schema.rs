//! File roles and per-file column schemas

use crate::normalize::normalize;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Logical purpose of an uploaded file, independent of its filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// One row per patient
    Patients,
    /// One row per visit
    Visits,
    /// One row per recorded metric observation
    Metrics,
}

impl FileRole {
    /// All roles in merge order
    pub const ALL: [FileRole; 3] = [FileRole::Patients, FileRole::Visits, FileRole::Metrics];

    /// Lowercase role name, also used as the input file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Visits => "visits",
            Self::Metrics => "metrics",
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the loader types a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Identity column, kept as a trimmed string
    Key,
    /// Calendar date
    Date,
    /// Floating point measure; unparseable cells load as null
    Numeric,
    /// Free text or categorical label
    #[default]
    Text,
}

/// A required column as declared in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Name as written in the registry (reported back in errors)
    pub name: String,
    /// Loader typing for this column
    #[serde(default)]
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Create a column spec
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Canonical column name used for matching and as the loaded field name
    pub fn canonical(&self) -> String {
        normalize(&self.name)
    }
}

/// Required columns for one file role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    pub required_columns: Vec<ColumnSpec>,
}

impl FileSchema {
    /// Create a schema from column specs
    pub fn new(required_columns: Vec<ColumnSpec>) -> Self {
        Self { required_columns }
    }

    /// Declared kind for a canonical column name, if it is required
    pub fn kind_of(&self, canonical: &str) -> Option<ColumnKind> {
        self.required_columns
            .iter()
            .find(|c| c.canonical() == canonical)
            .map(|c| c.kind)
    }

    /// Declared names of required columns absent from `headers`
    ///
    /// `headers` may be raw or canonical; both sides are normalized before
    /// comparison. Order follows the declaration order.
    pub fn missing_columns<S: AsRef<str>>(&self, headers: &[S]) -> Vec<String> {
        let present: HashSet<String> = headers.iter().map(|h| normalize(h.as_ref())).collect();
        self.required_columns
            .iter()
            .filter(|c| !present.contains(&c.canonical()))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Fail with `MissingColumns` naming every absent column
    pub fn validate_headers<S: AsRef<str>>(&self, role: FileRole, headers: &[S]) -> Result<()> {
        let missing = self.missing_columns(headers);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns { role, missing })
        }
    }
}
