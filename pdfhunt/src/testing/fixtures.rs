//! Test fixtures for analysis runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use crate::config::HuntConfig;
use crate::context::nested::fields;
use crate::context::{NestedState, PipelineContext, StageContext};
use crate::events::NoOpEventSink;

/// Smallest byte sequence that still looks like a PDF.
pub const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

/// Writes a minimal PDF named `name` into `dir` and returns its path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, MINIMAL_PDF).expect("write test pdf");
    path
}

/// Builds a snapshot at `iteration` with `findings` placeholder findings.
#[must_use]
pub fn snapshot(iteration: u64, findings: usize) -> NestedState {
    let findings: Vec<_> = (0..findings)
        .map(|i| json!(format!("finding {i}")))
        .collect();
    NestedState::default()
        .with_field(fields::CURRENT_ITERATION, json!(iteration))
        .with_field(fields::ACCUMULATED_FINDINGS, json!(findings))
}

/// Builds a stage context with default configuration and a silent sink.
#[must_use]
pub fn stage_context(stage_name: &str) -> StageContext {
    Arc::new(
        PipelineContext::new("test", Arc::new(HuntConfig::default()))
            .with_event_sink(Arc::new(NoOpEventSink)),
    )
    .for_stage(stage_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), "sample.pdf");
        assert!(path.exists());
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_snapshot() {
        let state = snapshot(4, 2);
        assert_eq!(state.current_iteration(), 4);
        assert_eq!(state.findings_len(), 2);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_stage_context() {
        let ctx = stage_context("analyze");
        assert_eq!(ctx.stage_name(), "analyze");
        assert_eq!(ctx.config().max_iterations, 10);
    }
}
