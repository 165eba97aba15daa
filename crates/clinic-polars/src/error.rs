//! Error types for clinic-polars

use clinic_core::{FileRole, Stage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Taxonomy errors (unknown analysis, missing inputs/columns, bad dates, writes)
    #[error(transparent)]
    Core(#[from] clinic_core::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Statistics error: {0}")]
    Stats(#[from] clinic_stats::Error),

    #[error("Failed to read {role} file: {source}")]
    Csv {
        role: FileRole,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The taxonomy error behind this error, if any
    pub fn core(&self) -> Option<&clinic_core::Error> {
        match self {
            Self::Core(e) => Some(e),
            Self::Stage { source, .. } => source.core(),
            _ => None,
        }
    }

    /// Attach the pipeline stage to engine failures
    ///
    /// Taxonomy errors pass through untouched so callers can match on them.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Core(_) | Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}
