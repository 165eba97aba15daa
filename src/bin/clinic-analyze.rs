//! Run a clinic analysis over a directory of CSV files
//!
//! The directory must hold `patients.csv`, `visits.csv` and `metrics.csv`. The
//! run summary is printed to stdout as JSON; logs go to stderr. Bad input
//! (unknown analysis, missing file or column, malformed date) exits with 2.

use anyhow::{Context, Result};
use clap::Parser;
use clinic_core::{AnalysisRegistry, DateRange};
use clinic_polars::{run_analysis, DirectorySource, RunWorkspace};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clinic-analyze", version, about = "Run a clinic analysis over CSV inputs")]
struct Cli {
    /// Directory holding patients.csv, visits.csv and metrics.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Write one CSV per aggregate under <output-root>/<run-id>
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Analysis key
    #[arg(long, default_value = "basic_clinic")]
    analysis: String,

    /// Earliest visit date to include (inclusive)
    #[arg(long)]
    start_date: Option<String>,

    /// Latest visit date to include (inclusive)
    #[arg(long)]
    end_date: Option<String>,

    /// JSON registry to use instead of the built-in analyses
    #[arg(long)]
    registry: Option<PathBuf>,

    /// List available analyses and exit
    #[arg(long)]
    list: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Whether anything in the chain is a schema or input validation failure
fn is_input_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<clinic_polars::Error>()
            .and_then(clinic_polars::Error::core)
            .or_else(|| cause.downcast_ref::<clinic_core::Error>())
            .is_some_and(clinic_core::Error::is_input_error)
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if is_input_error(&err) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let registry = match &cli.registry {
        Some(path) => AnalysisRegistry::from_json_file(path)
            .with_context(|| format!("loading registry from {}", path.display()))?,
        None => AnalysisRegistry::builtin(),
    };

    if cli.list {
        for definition in registry.definitions() {
            println!("{}\t{}", definition.key, definition.label);
        }
        return Ok(());
    }

    let range = DateRange::parse(cli.start_date.as_deref(), cli.end_date.as_deref())?;
    let inputs = DirectorySource::new(&cli.data_dir);
    info!(analysis = %cli.analysis, data_dir = %inputs.dir().display(), range = %range, "Starting run");
    let output = run_analysis(&registry, &cli.analysis, &inputs, &range)
        .with_context(|| format!("running analysis '{}'", cli.analysis))?;

    if let Some(root) = &cli.output_root {
        let workspace = RunWorkspace::create(root, output.run_id)?;
        let mut sink = workspace.sink();
        let written = output.write_to(&mut sink)?;
        info!(dir = %sink.dir().display(), artifacts = written.len(), "Results written");
    }

    println!("{}", serde_json::to_string_pretty(&output.summary())?);
    Ok(())
}
