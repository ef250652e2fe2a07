//! Input validation and run id assignment.

use super::Stage;
use crate::context::{ExecutionContext, RunId, StageContext, StateRecord};
use crate::errors::{HuntError, InputError};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

/// Checks the input path, then assigns a fresh [`RunId`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateStage;

impl ValidateStage {
    /// Stage name used in events and errors.
    pub const NAME: &'static str = "validate";

    /// Creates a new validate stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Runs the input checks in order: non-empty, exists, expected extension.
///
/// The extension comparison ignores ASCII case.
pub fn check_input(path: &Path, expected_extension: &str) -> Result<(), InputError> {
    if path.as_os_str().is_empty() {
        return Err(InputError::MissingPath);
    }

    if !path.exists() {
        return Err(InputError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected_extension));
    if !matches {
        return Err(InputError::WrongType {
            path: path.to_path_buf(),
            expected: expected_extension.to_string(),
        });
    }

    Ok(())
}

#[async_trait]
impl Stage for ValidateStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(
        &self,
        record: StateRecord,
        ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        ctx.try_emit_event(
            "validate.started",
            Some(json!({"message": "PDF threat hunter - validation phase"})),
        );

        if let Err(err) = check_input(record.input_path(), &ctx.config().expected_extension) {
            ctx.try_emit_event(
                "validate.failed",
                Some(json!({"message": err.to_string(), "kind": err.kind()})),
            );
            return Err(err.into());
        }

        let run_id = RunId::generate();
        ctx.try_emit_event(
            "validate.passed",
            Some(json!({
                "message": "PDF validation passed",
                "file": record.input_path().display().to_string(),
                "run_id": run_id.as_str(),
            })),
        );

        Ok(record.with_run_id(run_id))
    }
}
