//! Delegation to the nested analysis pipeline.

use super::Stage;
use crate::context::{ExecutionContext, NestedState, StageContext, StateRecord};
use crate::errors::HuntError;
use crate::report::ReportMaterializer;
use crate::subpipeline::{AnalysisPipeline, SnapshotFold};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Runs the nested pipeline, narrates its progress, persists the artifacts,
/// and stores the derived report on the record.
#[derive(Clone)]
pub struct DelegateStage {
    analysis: Arc<dyn AnalysisPipeline>,
}

impl DelegateStage {
    /// Stage name used in events and errors.
    pub const NAME: &'static str = "analyze";

    /// Creates a delegate stage driving `analysis`.
    #[must_use]
    pub fn new(analysis: Arc<dyn AnalysisPipeline>) -> Self {
        Self { analysis }
    }
}

impl std::fmt::Debug for DelegateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateStage")
            .field("analysis", &self.analysis.name())
            .finish()
    }
}

#[async_trait]
impl Stage for DelegateStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(
        &self,
        record: StateRecord,
        ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        let run_id = record.require_run_id(ctx.stage_name())?.clone();
        let config = ctx.config();

        ctx.try_emit_event(
            "analyze.started",
            Some(json!({
                "message": "Starting static analysis subgraph",
                "analysis": self.analysis.name(),
                "run_id": run_id.as_str(),
            })),
        );

        let initial = NestedState::initial(record.input_path(), config.max_iterations);
        let mut snapshots = self.analysis.stream(initial);
        let mut fold = SnapshotFold::new(config.action_preview_chars);

        while let Some(item) = snapshots.next().await {
            let snapshot = match item {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    ctx.try_emit_event(
                        "analyze.failed",
                        Some(json!({
                            "message": format!("Nested analysis failed: {err}"),
                            "snapshots": fold.snapshot_count(),
                        })),
                    );
                    return Err(err.into());
                }
            };
            for observation in fold.observe(snapshot) {
                ctx.try_emit_event(observation.event_type(), Some(observation.to_event_data()));
            }
        }
        drop(snapshots);

        let summary = fold.finish();
        debug!(
            snapshots = summary.snapshot_count,
            iteration = summary.highest_iteration,
            "Nested stream drained"
        );

        ctx.try_emit_event(
            "analyze.summary",
            Some(json!({
                "message": format!(
                    "Analysis complete: {} commands, {} findings",
                    summary.commands_count, summary.findings_count
                ),
                "commands": summary.commands_count,
                "findings": summary.findings_count,
                "report_chars": summary.derived_report.chars().count(),
                "completed": summary.completed,
            })),
        );

        let artifacts = ReportMaterializer::from_config(config).materialize(
            &run_id,
            record.input_path(),
            summary.terminal.as_ref(),
            &summary.derived_report,
        );
        for path in artifacts.written() {
            ctx.try_emit_event(
                "report.saved",
                Some(json!({
                    "message": format!("Saved {}", path.display()),
                    "path": path.display().to_string(),
                })),
            );
        }
        for err in artifacts.failures() {
            ctx.try_emit_event(
                "report.warning",
                Some(json!({
                    "message": format!("Could not save report: {err}"),
                    "path": err.path().display().to_string(),
                })),
            );
        }

        Ok(record.with_report(summary.derived_report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HuntConfig;
    use crate::context::nested::fields;
    use crate::context::{PipelineContext, RunId};
    use crate::errors::NestedPipelineError;
    use crate::events::CollectingEventSink;
    use crate::subpipeline::NO_REPORT_SENTINEL;
    use crate::testing::{snapshot, write_pdf, ScriptedAnalysis};
    use std::path::Path;

    fn stage_context(config: HuntConfig, sink: Arc<CollectingEventSink>) -> StageContext {
        Arc::new(PipelineContext::new("test", Arc::new(config)).with_event_sink(sink))
            .for_stage(DelegateStage::NAME)
    }

    fn validated(path: &Path) -> StateRecord {
        StateRecord::new(path).with_run_id(RunId::new("00c0ffee").unwrap())
    }

    #[tokio::test]
    async fn test_delegate_derives_report_and_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "doc.pdf");
        let sink = Arc::new(CollectingEventSink::new());
        let analysis = Arc::new(ScriptedAnalysis::new(vec![
            snapshot(1, 0),
            snapshot(2, 1),
            snapshot(3, 2)
                .with_field(fields::COMMAND_HISTORY, json!(["pdfid doc.pdf", "pdf-parser -a doc.pdf"]))
                .with_field(fields::ANALYSIS_COMPLETE, json!(true))
                .with_field(fields::FINAL_REPORT, json!("clean")),
        ]));
        let config = HuntConfig::default().with_output_dir(dir.path());

        let output = DelegateStage::new(analysis.clone())
            .execute(validated(&pdf), &stage_context(config, sink.clone()))
            .await
            .unwrap();

        assert_eq!(output.report(), Some("clean"));
        assert_eq!(output.run_id().map(RunId::as_str), Some("00c0ffee"));
        assert_eq!(analysis.calls(), 1);

        let initial = analysis.last_initial().unwrap();
        assert_eq!(initial.get(fields::PDF_FILEPATH).unwrap(), pdf.display().to_string().as_str());
        assert_eq!(initial.get(fields::MAX_ITERATIONS).unwrap(), 10);

        assert_eq!(sink.events_of_type("analyze.iteration").len(), 3);
        assert_eq!(sink.events_of_type("analyze.findings").len(), 2);
        assert_eq!(sink.events_of_type("analyze.completed_flag").len(), 1);
        let summary = sink.events_of_type("analyze.summary");
        assert_eq!(summary[0].1.as_ref().unwrap()["commands"], 2);
        assert_eq!(summary[0].1.as_ref().unwrap()["findings"], 2);
        assert_eq!(sink.events_of_type("report.saved").len(), 2);

        assert!(dir.path().join("pdf_analysis_report_00c0ffee.json").exists());
        let markdown =
            std::fs::read_to_string(dir.path().join("pdf_analysis_report_00c0ffee.md")).unwrap();
        assert!(markdown.contains("**Analysis ID:** 00c0ffee"));
        assert!(markdown.ends_with("clean"));
    }

    #[tokio::test]
    async fn test_delegate_with_no_snapshots_uses_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "doc.pdf");
        let sink = Arc::new(CollectingEventSink::new());
        let config = HuntConfig::default().with_output_dir(dir.path());

        let output = DelegateStage::new(Arc::new(ScriptedAnalysis::new(Vec::new())))
            .execute(validated(&pdf), &stage_context(config, sink.clone()))
            .await
            .unwrap();

        assert_eq!(output.report(), Some(NO_REPORT_SENTINEL));
        let summary = sink.events_of_type("analyze.summary");
        assert_eq!(summary[0].1.as_ref().unwrap()["findings"], 0);
        assert_eq!(summary[0].1.as_ref().unwrap()["commands"], 0);
    }

    #[tokio::test]
    async fn test_delegate_propagates_nested_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "doc.pdf");
        let sink = Arc::new(CollectingEventSink::new());
        let analysis = ScriptedAnalysis::new(vec![snapshot(1, 0)]).failing_after(1, "model offline");
        let config = HuntConfig::default().with_output_dir(dir.path());

        let err = DelegateStage::new(Arc::new(analysis))
            .execute(validated(&pdf), &stage_context(config, sink.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, HuntError::Nested(NestedPipelineError::Failed(ref m)) if m == "model offline"));
        assert_eq!(sink.events_of_type("analyze.failed").len(), 1);
        assert!(sink.events_of_type("report.saved").is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_delegate_survives_artifact_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "doc.pdf");
        let sink = Arc::new(CollectingEventSink::new());
        let analysis = ScriptedAnalysis::new(vec![
            snapshot(1, 1).with_field(fields::FINAL_REPORT, json!("suspicious JavaScript")),
        ]);
        let config = HuntConfig::default().with_output_dir(dir.path().join("missing"));

        let output = DelegateStage::new(Arc::new(analysis))
            .execute(validated(&pdf), &stage_context(config, sink.clone()))
            .await
            .unwrap();

        assert_eq!(output.report(), Some("suspicious JavaScript"));
        assert_eq!(sink.events_of_type("report.warning").len(), 2);
        assert!(sink.events_of_type("report.saved").is_empty());
    }

    #[tokio::test]
    async fn test_delegate_requires_run_id() {
        let analysis = Arc::new(ScriptedAnalysis::new(vec![snapshot(1, 0)]));
        let sink = Arc::new(CollectingEventSink::new());

        let err = DelegateStage::new(analysis.clone())
            .execute(
                StateRecord::new("doc.pdf"),
                &stage_context(HuntConfig::default(), sink),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HuntError::MissingField { field: "run_id", .. }));
        assert_eq!(analysis.calls(), 0);
    }
}
