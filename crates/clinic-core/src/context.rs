//! Per-run execution context
//!
//! A `RunContext` is created for every analysis run and never shared between
//! runs. It carries the run id used to scope output locations and records how
//! long each pipeline stage took.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Merge,
    Filter,
    Aggregate,
    Compare,
    Write,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Merge => "merge",
            Self::Filter => "filter",
            Self::Aggregate => "aggregate",
            Self::Compare => "compare",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context that flows through one analysis run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique id for this run
    pub run_id: Uuid,
    /// When the run started
    pub start_time: Instant,
    /// Stage timing information, in completion order
    stage_timings: Vec<(Stage, Duration)>,
}

impl RunContext {
    /// Create a context with a fresh run id
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    /// Create a context with a specific run id
    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            start_time: Instant::now(),
            stage_timings: Vec::new(),
        }
    }

    /// Run `f` and record its duration under `stage`
    pub fn time_stage<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = f();
        self.record_stage(stage, started.elapsed());
        out
    }

    /// Record a stage duration measured elsewhere
    pub fn record_stage(&mut self, stage: Stage, elapsed: Duration) {
        tracing::debug!(run_id = %self.run_id, %stage, ?elapsed, "Stage finished");
        self.stage_timings.push((stage, elapsed));
    }

    /// Duration of a completed stage
    pub fn stage_timing(&self, stage: Stage) -> Option<Duration> {
        self.stage_timings
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
    }

    /// All recorded stages in completion order
    pub fn stage_timings(&self) -> &[(Stage, Duration)] {
        &self.stage_timings
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
