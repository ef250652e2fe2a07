//! Report artifacts for a finished analysis.
//!
//! Two files are written per run, both named from the run id:
//!
//! - `<prefix>_<run_id>.json`: the entire terminal nested snapshot
//! - `<prefix>_<run_id>.md`: a human-readable report
//!
//! Writes are independent and best-effort. A failure is captured in
//! [`MaterializedArtifacts`] and logged; it never aborts the run.

use crate::config::HuntConfig;
use crate::context::{NestedState, RunId};
use crate::errors::ArtifactError;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Heading of the markdown report.
pub const REPORT_HEADER: &str = "# PDF Threat Analysis Report";

/// Result of materializing one run's artifacts.
#[derive(Debug)]
pub struct MaterializedArtifacts {
    /// Outcome of the structured dump.
    pub json: Result<PathBuf, ArtifactError>,
    /// Outcome of the markdown report.
    pub markdown: Result<PathBuf, ArtifactError>,
}

impl MaterializedArtifacts {
    /// Paths that were written successfully.
    #[must_use]
    pub fn written(&self) -> Vec<&Path> {
        [&self.json, &self.markdown]
            .into_iter()
            .filter_map(|r| r.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }

    /// Writes that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&ArtifactError> {
        [&self.json, &self.markdown]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
            .collect()
    }

    /// Whether both artifacts were written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.json.is_ok() && self.markdown.is_ok()
    }
}

/// Writes report artifacts into a directory.
#[derive(Debug, Clone)]
pub struct ReportMaterializer {
    output_dir: PathBuf,
    prefix: String,
}

impl ReportMaterializer {
    /// Creates a materializer writing `<prefix>_<run_id>.*` under `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Creates a materializer from the run configuration.
    #[must_use]
    pub fn from_config(config: &HuntConfig) -> Self {
        Self::new(&config.output_dir, &config.artifact_prefix)
    }

    /// File name of the structured dump for `run_id`.
    #[must_use]
    pub fn json_file_name(&self, run_id: &RunId) -> String {
        format!("{}_{run_id}.json", self.prefix)
    }

    /// File name of the markdown report for `run_id`.
    #[must_use]
    pub fn markdown_file_name(&self, run_id: &RunId) -> String {
        format!("{}_{run_id}.md", self.prefix)
    }

    /// Writes both artifacts. Never fails; inspect the returned outcomes.
    pub fn materialize(
        &self,
        run_id: &RunId,
        input_path: &Path,
        snapshot: Option<&NestedState>,
        report: &str,
    ) -> MaterializedArtifacts {
        let json_path = self.output_dir.join(self.json_file_name(run_id));
        let markdown_path = self.output_dir.join(self.markdown_file_name(run_id));

        let json = write_snapshot(&json_path, snapshot).map(|()| json_path);
        let markdown =
            write_markdown(&markdown_path, run_id, input_path, report).map(|()| markdown_path);

        for outcome in [&json, &markdown] {
            match outcome {
                Ok(path) => info!(path = %path.display(), "Saved report artifact"),
                Err(err) => warn!(error = %err, "Could not save report artifact"),
            }
        }

        MaterializedArtifacts { json, markdown }
    }
}

/// Renders the markdown report body.
#[must_use]
pub fn render_markdown(run_id: &RunId, input_path: &Path, report: &str) -> String {
    format!(
        "{REPORT_HEADER}\n\n**PDF File:** {}\n**Analysis ID:** {run_id}\n\n## Static Analysis Report\n\n{report}",
        input_path.display()
    )
}

// Snapshots hold only JSON values, so the dump cannot hit an unserializable value.
fn write_snapshot(path: &Path, snapshot: Option<&NestedState>) -> Result<(), ArtifactError> {
    let value = snapshot.map_or(Value::Null, |s| Value::from(s.clone()));

    let file = create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &value).map_err(|e| {
        ArtifactError::Serialization {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    writer.flush().map_err(|source| io_error(path, source))
}

fn write_markdown(
    path: &Path,
    run_id: &RunId,
    input_path: &Path,
    report: &str,
) -> Result<(), ArtifactError> {
    let file = create(path)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render_markdown(run_id, input_path, report).as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|source| io_error(path, source))
}

fn create(path: &Path) -> Result<File, ArtifactError> {
    File::create(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}
