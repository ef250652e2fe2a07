//! Run configuration.

use crate::errors::HuntError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntConfig {
    /// File extension accepted by validation, without the dot.
    #[serde(default = "default_expected_extension")]
    pub expected_extension: String,
    /// Iteration budget handed to the nested analysis pipeline.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Directory the report artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// File name prefix of the report artifacts.
    #[serde(default = "default_artifact_prefix")]
    pub artifact_prefix: String,
    /// Characters of a pending action shown in narration.
    #[serde(default = "default_action_preview_chars")]
    pub action_preview_chars: usize,
}

fn default_expected_extension() -> String {
    "pdf".to_string()
}

fn default_max_iterations() -> u32 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_artifact_prefix() -> String {
    "pdf_analysis_report".to_string()
}

fn default_action_preview_chars() -> usize {
    50
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            expected_extension: default_expected_extension(),
            max_iterations: default_max_iterations(),
            output_dir: default_output_dir(),
            artifact_prefix: default_artifact_prefix(),
            action_preview_chars: default_action_preview_chars(),
        }
    }
}

impl HuntConfig {
    /// Loads a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HuntError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HuntError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| HuntError::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the accepted extension.
    #[must_use]
    pub fn with_expected_extension(mut self, extension: impl Into<String>) -> Self {
        self.expected_extension = extension.into();
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the artifact directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the artifact file name prefix.
    #[must_use]
    pub fn with_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = prefix.into();
        self
    }

    /// Checks the configuration for unusable values.
    pub fn validate(&self) -> Result<(), HuntError> {
        if self.max_iterations == 0 {
            return Err(HuntError::Config("max_iterations must be at least 1".to_string()));
        }
        if self.expected_extension.trim().is_empty() {
            return Err(HuntError::Config("expected_extension cannot be empty".to_string()));
        }
        if self.expected_extension.starts_with('.') {
            return Err(HuntError::Config(format!(
                "expected_extension must not start with '.': {}",
                self.expected_extension
            )));
        }
        if self.artifact_prefix.trim().is_empty() {
            return Err(HuntError::Config("artifact_prefix cannot be empty".to_string()));
        }
        Ok(())
    }
}
