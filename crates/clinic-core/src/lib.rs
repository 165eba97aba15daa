//! Core types for clinic analytics
//!
//! This crate holds everything the analysis engine needs before it touches a
//! dataset:
//!
//! - **Schema registry**: analysis key -> required files, columns, aggregates
//!   and comparisons ([`AnalysisRegistry`])
//! - **Column normalizer**: canonical column names ([`normalize`])
//! - **Dates**: lenient date parsing and inclusive [`DateRange`]s
//! - **Errors**: the shared error taxonomy ([`Error`])
//! - **Run context**: per-run id and stage timings ([`RunContext`])
//!
//! # Example
//!
//! ```rust
//! use clinic_core::{AnalysisRegistry, FileRole};
//!
//! let registry = AnalysisRegistry::builtin();
//! let basic = registry.lookup("basic_clinic").unwrap();
//! let visits = basic.schema(FileRole::Visits).unwrap();
//!
//! assert!(visits.missing_columns(&["Patient ID", "visit_date", "SERVICE-CHARGE"]).is_empty());
//! assert!(registry.lookup("nonexistent").is_err());
//! ```

pub mod context;
pub mod dates;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod schema;

pub use context::{RunContext, Stage};
pub use dates::{days_since_epoch, parse_date, DateRange};
pub use error::{Error, Result};
pub use normalize::{normalize, normalize_all, same_column};
pub use registry::{
    AggregateKind, AggregateSpec, AnalysisDefinition, AnalysisRegistry, ComparisonSpec,
    MergeKeys, RegistryBuilder,
};
pub use schema::{ColumnKind, ColumnSpec, FileRole, FileSchema};
