//! Polars engine for clinic analytics
//!
//! Loads the three clinic CSV files into typed DataFrames, merges them into one
//! visit-level dataset, filters by visit date and computes the aggregates and
//! group comparisons an analysis declares.
//!
//! # Example
//!
//! ```rust,no_run
//! use clinic_core::{AnalysisRegistry, DateRange};
//! use clinic_polars::{run_analysis, DirectorySource, RunWorkspace};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AnalysisRegistry::builtin();
//! let inputs = DirectorySource::new("data/");
//! let range = DateRange::parse(Some("2024-01-01"), None)?;
//!
//! let output = run_analysis(&registry, "basic_clinic", &inputs, &range)?;
//! let workspace = RunWorkspace::create("out/", output.run_id)?;
//! output.write_to(&mut workspace.sink())?;
//! # Ok(())
//! # }
//! ```

mod error;
mod loader;
mod methods;
mod pipeline;
mod traits;
mod writer;

pub use error::{Error, Result};
pub use loader::{load_table, RawTable};
pub use methods::aggregate::{aggregate, AggregateResult};
pub use methods::compare::{compare_groups, split_groups};
pub use methods::filter::filter_by_date;
pub use methods::merge::{merge, MergedDataset};
pub use pipeline::{
    run_analysis, run_analysis_with_context, AnalysisOutput, DirectorySource, InMemoryInputs,
    InputSource, RunSummary,
};
pub use traits::ClinicFrameExt;
pub use writer::{
    to_csv_bytes, write_results, ArtifactSink, DirectorySink, MemorySink, RunWorkspace,
};
