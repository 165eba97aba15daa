//! Result artifacts
//!
//! Every aggregate is written as `<name>.csv` to an [`ArtifactSink`]. Sinks are
//! supplied by the caller, so concurrent runs never share an output location
//! unless the caller hands them the same sink.

use crate::methods::aggregate::AggregateResult;
use crate::Result;
use clinic_core::Error as CoreError;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Destination for named artifacts
pub trait ArtifactSink {
    /// Store `bytes` under `name`, replacing any earlier artifact of that name
    fn put(&mut self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes artifacts as files in one directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn put(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.dir.join(name), bytes)
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.artifacts.get(name).map(Vec::as_slice)
    }

    /// Artifact contents as UTF-8 text
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn put(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.artifacts.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Output directory owned by exactly one run: `<root>/<run_id>`
#[derive(Debug, Clone)]
pub struct RunWorkspace {
    run_id: Uuid,
    dir: PathBuf,
}

impl RunWorkspace {
    /// Create the run directory, failing if it already exists
    pub fn create(root: impl AsRef<Path>, run_id: Uuid) -> clinic_core::Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let dir = root.join(run_id.to_string());
        fs::create_dir(&dir)?;
        debug!(dir = %dir.display(), "Created run workspace");
        Ok(Self { run_id, dir })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// A sink writing into this workspace
    pub fn sink(&self) -> DirectorySink {
        DirectorySink::new(&self.dir)
    }
}

/// Serialize one aggregate table as CSV with a header row
pub fn to_csv_bytes(result: &AggregateResult) -> Result<Vec<u8>> {
    let mut frame = result.frame.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(buf)
}

/// Write every aggregate to `sink` as `<name>.csv`
///
/// Returns the artifact names in write order. On failure the artifacts already
/// written stay in place and `WriteError` names the one that failed.
pub fn write_results(
    results: &BTreeMap<String, AggregateResult>,
    sink: &mut dyn ArtifactSink,
) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(results.len());
    for (name, result) in results {
        let bytes = to_csv_bytes(result).map_err(|e| CoreError::write_failed(name, e))?;
        let artifact = format!("{name}.csv");
        sink.put(&artifact, &bytes)
            .map_err(|e| CoreError::write_failed(name, e))?;
        debug!(artifact = %artifact, bytes = bytes.len(), "Wrote artifact");
        written.push(artifact);
    }
    info!(artifacts = written.len(), "Wrote results");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::AggregateKind;

    struct FailingSink {
        accepted: usize,
    }

    impl ArtifactSink for FailingSink {
        fn put(&mut self, _name: &str, _bytes: &[u8]) -> io::Result<()> {
            if self.accepted == 0 {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.accepted -= 1;
            Ok(())
        }
    }

    fn result(name: &str) -> AggregateResult {
        AggregateResult {
            name: name.to_string(),
            kind: AggregateKind::GroupCount {
                group_by: "city".to_string(),
            },
            frame: df!["city" => ["Austin"], "count" => [2i64]].unwrap(),
        }
    }

    #[test]
    fn test_failure_names_the_artifact() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), result("a"));
        results.insert("b".to_string(), result("b"));

        let mut sink = FailingSink { accepted: 1 };
        let err = write_results(&results, &mut sink).unwrap_err();
        match err.core() {
            Some(CoreError::WriteError { name, cause }) => {
                assert_eq!(name, "b");
                assert!(cause.contains("read-only"));
            }
            other => panic!("expected WriteError, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_has_header_row() {
        let bytes = to_csv_bytes(&result("visits")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().next(), Some("city,count"));
        assert_eq!(text.lines().nth(1), Some("Austin,2"));
    }
}
