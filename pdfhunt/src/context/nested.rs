//! The nested analysis pipeline's own record.
//!
//! The outer orchestrator treats this record as opaque JSON. Only the fields in
//! [`fields`] have a known meaning, and even those may be missing from any
//! given snapshot, so every accessor falls back to an empty/zero value.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;

/// Field names of the nested record contract.
pub mod fields {
    /// Path of the document under analysis.
    pub const PDF_FILEPATH: &str = "pdf_filepath";
    /// Natural-language task description.
    pub const ORIGINAL_USER_REQUEST: &str = "original_user_request";
    /// Iteration budget.
    pub const MAX_ITERATIONS: &str = "max_iterations";
    /// Conversation messages.
    pub const MESSAGES: &str = "messages";
    /// Raw `pdfid` tool output.
    pub const PDFID_OUTPUT: &str = "pdfid_output";
    /// Raw `pdf-parser --stats` tool output.
    pub const PDFSTATS_OUTPUT: &str = "pdfstats_output";
    /// Commands executed so far.
    pub const COMMAND_HISTORY: &str = "command_history";
    /// Findings accumulated so far, append-only.
    pub const ACCUMULATED_FINDINGS: &str = "accumulated_findings";
    /// Intermediate artifacts keyed by name.
    pub const CODE_BLOCKS: &str = "code_blocks";
    /// Monotonic iteration counter.
    pub const CURRENT_ITERATION: &str = "current_iteration";
    /// The next action the analysis intends to take.
    pub const NEXT_COMMAND_TO_RUN: &str = "next_command_to_run";
    /// Rationale for the next action.
    pub const COMMAND_REASONING: &str = "command_reasoning";
    /// Completion flag.
    pub const ANALYSIS_COMPLETE: &str = "analysis_complete";
    /// Terminal textual report.
    pub const FINAL_REPORT: &str = "final_report";
}

/// One snapshot of the nested pipeline's state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedState(Map<String, Value>);

impl NestedState {
    /// Builds the initial record handed to the nested pipeline.
    ///
    /// Every field the nested contract requires at entry is present, with empty
    /// collections, a zero counter, a cleared flag and null optionals.
    #[must_use]
    pub fn initial(input_path: &Path, max_iterations: u32) -> Self {
        let path = input_path.display().to_string();
        let request = format!(
            "Analyze the PDF file at {path} for any signs of malicious or suspicious activity."
        );

        let mut map = Map::new();
        map.insert(fields::PDF_FILEPATH.to_string(), json!(path));
        map.insert(fields::ORIGINAL_USER_REQUEST.to_string(), json!(request));
        map.insert(fields::MAX_ITERATIONS.to_string(), json!(max_iterations));
        map.insert(fields::MESSAGES.to_string(), json!([]));
        map.insert(fields::PDFID_OUTPUT.to_string(), json!(""));
        map.insert(fields::PDFSTATS_OUTPUT.to_string(), json!(""));
        map.insert(fields::COMMAND_HISTORY.to_string(), json!([]));
        map.insert(fields::ACCUMULATED_FINDINGS.to_string(), json!([]));
        map.insert(fields::CODE_BLOCKS.to_string(), json!({}));
        map.insert(fields::CURRENT_ITERATION.to_string(), json!(0));
        map.insert(fields::NEXT_COMMAND_TO_RUN.to_string(), Value::Null);
        map.insert(fields::COMMAND_REASONING.to_string(), Value::Null);
        map.insert(fields::ANALYSIS_COMPLETE.to_string(), json!(false));
        map.insert(fields::FINAL_REPORT.to_string(), Value::Null);
        Self(map)
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Iteration counter, 0 when absent or not a non-negative integer.
    #[must_use]
    pub fn current_iteration(&self) -> u64 {
        self.get(fields::CURRENT_ITERATION)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Number of accumulated findings.
    #[must_use]
    pub fn findings_len(&self) -> usize {
        self.array_len(fields::ACCUMULATED_FINDINGS)
    }

    /// Number of executed commands.
    #[must_use]
    pub fn commands_len(&self) -> usize {
        self.array_len(fields::COMMAND_HISTORY)
    }

    /// Whether the completion flag is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.get(fields::ANALYSIS_COMPLETE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The pending next action, if present and non-empty.
    #[must_use]
    pub fn next_action(&self) -> Option<&str> {
        self.non_empty_str(fields::NEXT_COMMAND_TO_RUN)
    }

    /// The final report, if present and non-empty.
    #[must_use]
    pub fn final_report(&self) -> Option<&str> {
        self.non_empty_str(fields::FINAL_REPORT)
    }

    fn array_len(&self, key: &str) -> usize {
        self.get(key).and_then(Value::as_array).map_or(0, Vec::len)
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl TryFrom<Value> for NestedState {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(format!("expected a JSON object, got {}", json_type(&other))),
        }
    }
}

impl From<NestedState> for Value {
    fn from(state: NestedState) -> Self {
        Self::Object(state.0)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
