//! Clinic analytics
//!
//! Umbrella crate re-exporting the workspace:
//!
//! - [`clinic_core`]: schema registry, column normalizer, dates, error taxonomy
//! - [`clinic_stats`]: Pearson correlation and Welch's t-test
//! - [`clinic_polars`]: Polars loading, merging, filtering, aggregation and writing
//!
//! # Example
//!
//! ```rust
//! use clinic_analytics::prelude::*;
//!
//! let inputs = InMemoryInputs::new()
//!     .with(FileRole::Patients, "Patient ID,Insurance,DOB,City,State\n1,BlueCross,1980-05-01,X,TX\n")
//!     .with(FileRole::Visits, "Patient ID,Visit Date,Service Charge\n1,2024-01-10,100\n")
//!     .with(FileRole::Metrics, "Patient ID,Metric Date,Pain Score,Mobility Score\n1,2024-01-10,5,3\n");
//!
//! let registry = AnalysisRegistry::builtin();
//! let output = run_analysis(&registry, "basic_clinic", &inputs, &DateRange::unbounded()).unwrap();
//! assert_eq!(output.rows_analyzed, 1);
//! ```

pub use clinic_core;
pub use clinic_polars;
pub use clinic_stats;

/// Commonly used items
pub mod prelude {
    pub use clinic_core::{
        normalize, AnalysisDefinition, AnalysisRegistry, DateRange, FileRole, RunContext,
    };
    pub use clinic_polars::{
        run_analysis, AnalysisOutput, ArtifactSink, ClinicFrameExt, DirectorySource,
        InMemoryInputs, InputSource, MemorySink, RunWorkspace,
    };
    pub use clinic_stats::StatResult;
}
