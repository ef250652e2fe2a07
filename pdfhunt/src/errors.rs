//! Error types for pdfhunt runs.
//!
//! Errors fall into three groups:
//!
//! - **Fatal** errors ([`HuntError`]) abort the pipeline immediately.
//! - **Input** errors ([`InputError`]) are the fatal errors raised by validation,
//!   one distinct variant per cause.
//! - **Artifact** errors ([`ArtifactError`]) are captured locally by the report
//!   materializer and never abort a run.

use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pipeline runs.
#[derive(Debug, Error)]
pub enum HuntError {
    /// The input file failed validation.
    #[error("{0}")]
    Input(#[from] InputError),

    /// The nested analysis pipeline failed irrecoverably.
    #[error("{0}")]
    Nested(#[from] NestedPipelineError),

    /// The pipeline could not be assembled.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage needed a field an earlier stage should have set.
    #[error("Stage '{stage}' requires field '{field}', which is not set")]
    MissingField {
        /// The stage that read the field.
        stage: String,
        /// The missing field.
        field: &'static str,
    },

    /// A stage returned a record that breaks the threading contract.
    #[error("Stage '{stage}' violated the state contract: {reason}")]
    StateContract {
        /// The offending stage.
        stage: String,
        /// What was violated.
        reason: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HuntError {
    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(stage: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            stage: stage.into(),
            field,
        }
    }

    /// Creates a state contract error.
    #[must_use]
    pub fn state_contract(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StateContract {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Returns a short machine-readable kind for event payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(err) => err.kind(),
            Self::Nested(_) => "nested_pipeline",
            Self::Validation(_) => "pipeline_validation",
            Self::MissingField { .. } => "missing_field",
            Self::StateContract { .. } => "state_contract",
            Self::Config(_) => "config",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

/// Validation failures for the input document, one per check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// No path was supplied.
    #[error("PDF path is required")]
    MissingPath,

    /// The path does not exist.
    #[error("PDF file not found at: {}", path.display())]
    NotFound {
        /// The path that was checked.
        path: PathBuf,
    },

    /// The path does not carry the expected suffix.
    #[error("File must be a PDF (must have .{expected} extension): {}", path.display())]
    WrongType {
        /// The path that was checked.
        path: PathBuf,
        /// The expected extension, without the dot.
        expected: String,
    },
}

impl InputError {
    /// Returns a short machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingPath => "missing_path",
            Self::NotFound { .. } => "not_found",
            Self::WrongType { .. } => "wrong_type",
        }
    }
}

/// Errors raised by a nested analysis pipeline.
#[derive(Debug, Error)]
pub enum NestedPipelineError {
    /// The analyzer could not be started.
    #[error("Failed to launch analyzer '{program}': {source}")]
    Spawn {
        /// The program that was launched.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be decoded.
    #[error("Malformed snapshot at line {line}: {reason}")]
    MalformedSnapshot {
        /// One-based line number in the snapshot stream.
        line: usize,
        /// Why decoding failed.
        reason: String,
    },

    /// The analyzer terminated abnormally.
    #[error("Analyzer exited abnormally: {0}")]
    Exited(String),

    /// IO failure while talking to the analyzer.
    #[error("Analyzer IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The analysis itself failed.
    #[error("Analysis failed: {0}")]
    Failed(String),
}

impl NestedPipelineError {
    /// Creates a generic analysis failure.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Errors writing a report artifact. Always recoverable.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact file could not be written.
    #[error("Could not write {}: {source}", path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("Could not serialize {}: {reason}", path.display())]
    Serialization {
        /// Destination path.
        path: PathBuf,
        /// Why serialization failed.
        reason: String,
    },
}

impl ArtifactError {
    /// Returns the destination path the write was aimed at.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Serialization { path, .. } => path,
        }
    }
}

/// Error raised when a pipeline cannot be built.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), json!(self.message));
        map.insert("stages".to_string(), json!(self.stages));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_distinct() {
        let missing = InputError::MissingPath;
        let not_found = InputError::NotFound {
            path: PathBuf::from("missing.pdf"),
        };
        let wrong = InputError::WrongType {
            path: PathBuf::from("notes.txt"),
            expected: "pdf".to_string(),
        };

        assert_eq!(missing.kind(), "missing_path");
        assert_eq!(not_found.kind(), "not_found");
        assert_eq!(wrong.kind(), "wrong_type");
        assert!(not_found.to_string().contains("missing.pdf"));
        assert!(wrong.to_string().contains(".pdf extension"));
    }

    #[test]
    fn test_hunt_error_kind_passes_through_input() {
        let err = HuntError::from(InputError::MissingPath);
        assert_eq!(err.kind(), "missing_path");
        assert_eq!(err.to_string(), "PDF path is required");
    }

    #[test]
    fn test_hunt_error_to_dict() {
        let err = HuntError::missing_field("analyze", "run_id");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "missing_field");
        assert!(dict
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap()
            .contains("run_id"));
    }

    #[test]
    fn test_nested_error_is_preserved() {
        let err = HuntError::from(NestedPipelineError::failed("tool crashed"));
        assert!(matches!(err, HuntError::Nested(NestedPipelineError::Failed(ref r)) if r == "tool crashed"));
    }

    #[test]
    fn test_artifact_error_path() {
        let err = ArtifactError::Serialization {
            path: PathBuf::from("out/report.json"),
            reason: "bad".to_string(),
        };
        assert_eq!(err.path(), std::path::Path::new("out/report.json"));
    }

    #[test]
    fn test_pipeline_validation_error_to_dict() {
        let err = PipelineValidationError::new("Duplicate stage")
            .with_stages(vec!["validate".to_string()]);

        let dict = err.to_dict();
        assert_eq!(dict.get("message").unwrap(), "Duplicate stage");
        assert_eq!(dict.get("stages").unwrap(), &json!(["validate"]));
    }
}
