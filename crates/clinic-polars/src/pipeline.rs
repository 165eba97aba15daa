//! End-to-end analysis runs
//!
//! A run resolves the analysis definition first, then collects all three input
//! files, and only then parses anything. Each stage is timed on the run's
//! [`RunContext`] and engine failures are tagged with the stage they came from.

use crate::loader::{load_table, RawTable};
use crate::methods::aggregate::{aggregate, AggregateResult};
use crate::methods::compare::compare_groups;
use crate::methods::filter::filter_by_date;
use crate::methods::merge::merge;
use crate::writer::{write_results, ArtifactSink};
use crate::Result;
use clinic_core::{
    AnalysisDefinition, AnalysisRegistry, DateRange, Error as CoreError, FileRole, RunContext,
    Stage,
};
use clinic_stats::StatResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Where a run gets its raw CSV bytes from
pub trait InputSource {
    /// Bytes of the file for `role`, `None` if it was not supplied
    fn fetch(&self, role: FileRole) -> Option<Vec<u8>>;
}

/// Inputs held in memory, e.g. from an upload
#[derive(Debug, Clone, Default)]
pub struct InMemoryInputs {
    files: BTreeMap<FileRole, Vec<u8>>,
}

impl InMemoryInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, role: FileRole, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(role, bytes);
        self
    }

    pub fn insert(&mut self, role: FileRole, bytes: impl Into<Vec<u8>>) {
        self.files.insert(role, bytes.into());
    }
}

impl InputSource for InMemoryInputs {
    fn fetch(&self, role: FileRole) -> Option<Vec<u8>> {
        self.files.get(&role).cloned()
    }
}

/// Reads `<dir>/<role>.csv`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the file for `role` is expected at
    pub fn path_for(&self, role: FileRole) -> PathBuf {
        self.dir.join(format!("{role}.csv"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl InputSource for DirectorySource {
    fn fetch(&self, role: FileRole) -> Option<Vec<u8>> {
        let path = self.path_for(role);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read input file");
                None
            }
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub run_id: Uuid,
    pub analysis: String,
    /// Aggregate tables by name
    pub aggregates: BTreeMap<String, AggregateResult>,
    /// Comparison outcomes by name
    pub stats: BTreeMap<String, StatResult>,
    /// Rows left after the date filter
    pub rows_analyzed: usize,
    context: RunContext,
}

impl AnalysisOutput {
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Serializable overview of the run
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            analysis: self.analysis.clone(),
            run_id: self.run_id,
            rows_analyzed: self.rows_analyzed,
            aggregates: self.aggregates.keys().cloned().collect(),
            stats: self.stats.clone(),
            elapsed_ms: duration_ms(self.context.elapsed()),
        }
    }

    /// Write every aggregate plus `summary.json` to `sink`
    pub fn write_to(&self, sink: &mut dyn ArtifactSink) -> Result<Vec<String>> {
        let mut written = write_results(&self.aggregates, sink)
            .map_err(|e| e.in_stage(Stage::Write))?;
        let summary = serde_json::to_vec_pretty(&self.summary())
            .map_err(|e| CoreError::write_failed("summary", e))?;
        sink.put("summary.json", &summary)
            .map_err(|e| CoreError::write_failed("summary", e))?;
        written.push("summary.json".to_string());
        Ok(written)
    }
}

/// JSON-friendly run overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub analysis: String,
    pub run_id: Uuid,
    pub rows_analyzed: usize,
    pub aggregates: Vec<String>,
    pub stats: BTreeMap<String, StatResult>,
    pub elapsed_ms: f64,
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Run analysis `key` over `inputs`, restricted to `range`
pub fn run_analysis(
    registry: &AnalysisRegistry,
    key: &str,
    inputs: &dyn InputSource,
    range: &DateRange,
) -> Result<AnalysisOutput> {
    run_analysis_with_context(registry, key, inputs, range, RunContext::new())
}

/// Like [`run_analysis`], with a caller-supplied context
#[instrument(skip(registry, inputs, range, ctx), fields(run_id = %ctx.run_id, range = %range))]
pub fn run_analysis_with_context(
    registry: &AnalysisRegistry,
    key: &str,
    inputs: &dyn InputSource,
    range: &DateRange,
    mut ctx: RunContext,
) -> Result<AnalysisOutput> {
    let definition = registry.lookup(key)?;

    let mut raw = BTreeMap::new();
    for role in FileRole::ALL {
        let bytes = inputs
            .fetch(role)
            .ok_or(CoreError::MissingInputFile { role })?;
        raw.insert(role, bytes);
    }

    let [patients, visits, metrics] = ctx
        .time_stage(Stage::Load, || load_all(definition, &raw))
        .map_err(|e| e.in_stage(Stage::Load))?;
    drop(raw);

    let merged = ctx
        .time_stage(Stage::Merge, || {
            merge(&patients, &visits, &metrics, &definition.keys)
        })
        .map_err(|e| e.in_stage(Stage::Merge))?;

    let filtered = ctx
        .time_stage(Stage::Filter, || {
            filter_by_date(&merged, &definition.keys.visit_date, range)
        })
        .map_err(|e| e.in_stage(Stage::Filter))?;

    let aggregates = ctx
        .time_stage(Stage::Aggregate, || aggregate(&filtered, &definition.aggregates))
        .map_err(|e| e.in_stage(Stage::Aggregate))?;

    let stats = ctx
        .time_stage(Stage::Compare, || compare_all(&filtered, definition))
        .map_err(|e| e.in_stage(Stage::Compare))?;

    info!(
        analysis = %definition.key,
        rows = filtered.height(),
        aggregates = aggregates.len(),
        stats = stats.len(),
        elapsed_ms = duration_ms(ctx.elapsed()),
        "Analysis complete"
    );

    Ok(AnalysisOutput {
        run_id: ctx.run_id,
        analysis: definition.key.clone(),
        aggregates,
        stats,
        rows_analyzed: filtered.height(),
        context: ctx,
    })
}

fn load_all(
    definition: &AnalysisDefinition,
    raw: &BTreeMap<FileRole, Vec<u8>>,
) -> Result<[RawTable; 3]> {
    let load = |role: FileRole| -> Result<RawTable> {
        let bytes = raw
            .get(&role)
            .ok_or(CoreError::MissingInputFile { role })?;
        load_table(definition, role, bytes)
    };
    Ok([
        load(FileRole::Patients)?,
        load(FileRole::Visits)?,
        load(FileRole::Metrics)?,
    ])
}

fn compare_all(
    df: &polars::prelude::DataFrame,
    definition: &AnalysisDefinition,
) -> Result<BTreeMap<String, StatResult>> {
    definition
        .comparisons
        .iter()
        .map(|spec| Ok((spec.name.clone(), compare_groups(df, spec)?)))
        .collect()
}
