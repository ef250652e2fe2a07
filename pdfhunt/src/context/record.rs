//! The state record threaded through the outer pipeline.

use super::RunId;
use crate::errors::HuntError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Immutable-per-step record passed from stage to stage.
///
/// Each stage takes the record by value and returns a new one with zero or
/// more fields added or overwritten. Fields are never removed: there is no way
/// to clear `run_id` or `report` once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    input_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    report: Option<String>,
}

impl StateRecord {
    /// Creates the entry record for a run.
    #[must_use]
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            run_id: None,
            report: None,
        }
    }

    /// Returns the input document path.
    #[must_use]
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Returns the run id, if validation has assigned one.
    #[must_use]
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// Returns the derived report, if analysis has produced one.
    #[must_use]
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// Returns the record with `run_id` set.
    #[must_use]
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Returns the record with `report` set.
    #[must_use]
    pub fn with_report(mut self, report: impl Into<String>) -> Self {
        self.report = Some(report.into());
        self
    }

    /// Returns the run id or a `MissingField` error naming `stage`.
    pub fn require_run_id(&self, stage: &str) -> Result<&RunId, HuntError> {
        self.run_id
            .as_ref()
            .ok_or_else(|| HuntError::missing_field(stage, "run_id"))
    }

    /// Checks that `next` is a legal successor of this record.
    ///
    /// `input_path` must be unchanged, and a `run_id` that is already set must
    /// be carried forward as-is. A `report` may be added or overwritten but
    /// never dropped.
    pub fn check_successor(&self, next: &Self, stage: &str) -> Result<(), HuntError> {
        if next.input_path != self.input_path {
            return Err(HuntError::state_contract(stage, "input_path was modified"));
        }
        if let Some(ref current) = self.run_id {
            if next.run_id.as_ref() != Some(current) {
                return Err(HuntError::state_contract(stage, "run_id was reassigned"));
            }
        }
        if self.report.is_some() && next.report.is_none() {
            return Err(HuntError::state_contract(stage, "report was dropped"));
        }
        Ok(())
    }

    /// Converts to a dictionary representation with nulls for absent fields.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert(
            "input_path".to_string(),
            serde_json::json!(self.input_path.display().to_string()),
        );
        map.insert(
            "run_id".to_string(),
            self.run_id
                .as_ref()
                .map_or(serde_json::Value::Null, |id| serde_json::json!(id.as_str())),
        );
        map.insert(
            "report".to_string(),
            self.report
                .as_ref()
                .map_or(serde_json::Value::Null, |r| serde_json::json!(r)),
        );
        map
    }
}
