//! Final assessment of the derived report.

use super::Stage;
use crate::context::{ExecutionContext, RunId, StageContext, StateRecord};
use crate::errors::HuntError;
use crate::subpipeline::NO_REPORT_SENTINEL;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;

static THREAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)suspicious|malicious").expect("valid threat pattern"));

static CLEAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)clean|benign").expect("valid clean pattern"));

/// Coarse verdict derived from report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    /// The report mentions suspicious or malicious content.
    ThreatIndicators,
    /// The report calls the document clean or benign.
    AssessedClean,
    /// Neither.
    Indeterminate,
}

impl Assessment {
    /// Narration line for this verdict.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::ThreatIndicators => "THREAT DETECTED: Suspicious content found",
            Self::AssessedClean => "ASSESSMENT: File appears clean",
            Self::Indeterminate => "ASSESSMENT: Review report for details",
        }
    }

    /// Snake-case name used in event payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreatIndicators => "threat_indicators",
            Self::AssessedClean => "assessed_clean",
            Self::Indeterminate => "indeterminate",
        }
    }
}

/// Classifies report text. Threat terms win over clean terms.
#[must_use]
pub fn classify(report: &str) -> Assessment {
    if THREAT_PATTERN.is_match(report) {
        Assessment::ThreatIndicators
    } else if CLEAN_PATTERN.is_match(report) {
        Assessment::AssessedClean
    } else {
        Assessment::Indeterminate
    }
}

/// Narrates the verdict and returns the record unchanged.
///
/// A missing, empty or sentinel report is narrated as a warning instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizeStage;

impl FinalizeStage {
    /// Stage name used in events and errors.
    pub const NAME: &'static str = "finalize";

    /// Creates a new finalize stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for FinalizeStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(
        &self,
        record: StateRecord,
        ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        ctx.try_emit_event(
            "finalize.started",
            Some(json!({
                "message": "Finalizing threat assessment",
                "file": record.input_path().display().to_string(),
                "run_id": record.run_id().map(RunId::as_str),
            })),
        );

        match record
            .report()
            .filter(|r| !r.is_empty() && *r != NO_REPORT_SENTINEL)
        {
            Some(report) => {
                let assessment = classify(report);
                ctx.try_emit_event(
                    "finalize.assessment",
                    Some(json!({
                        "message": assessment.message(),
                        "assessment": assessment.as_str(),
                        "report_chars": report.chars().count(),
                    })),
                );
            }
            None => ctx.try_emit_event(
                "finalize.warning",
                Some(json!({"message": NO_REPORT_SENTINEL})),
            ),
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HuntConfig;
    use crate::context::PipelineContext;
    use crate::events::CollectingEventSink;
    use std::sync::Arc;

    fn stage_context(sink: Arc<CollectingEventSink>) -> StageContext {
        Arc::new(
            PipelineContext::new("test", Arc::new(HuntConfig::default())).with_event_sink(sink),
        )
        .for_stage(FinalizeStage::NAME)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Found MALICIOUS JavaScript"), Assessment::ThreatIndicators);
        assert_eq!(classify("somewhat Suspicious objects"), Assessment::ThreatIndicators);
        assert_eq!(classify("The file is clean."), Assessment::AssessedClean);
        assert_eq!(classify("Benign"), Assessment::AssessedClean);
        assert_eq!(classify("No embedded objects"), Assessment::Indeterminate);
        assert_eq!(classify(""), Assessment::Indeterminate);
    }

    #[test]
    fn test_threat_terms_take_precedence() {
        assert_eq!(
            classify("Mostly clean, but one suspicious stream"),
            Assessment::ThreatIndicators
        );
    }

    #[test]
    fn test_classify_is_idempotent() {
        for report in ["clean", "malicious", "unknown", NO_REPORT_SENTINEL] {
            assert_eq!(classify(report), classify(report));
        }
    }

    #[tokio::test]
    async fn test_finalize_returns_record_unchanged() {
        let sink = Arc::new(CollectingEventSink::new());
        let record = StateRecord::new("doc.pdf")
            .with_run_id(RunId::new("abcd1234").unwrap())
            .with_report("clean");

        let output = FinalizeStage::new()
            .execute(record.clone(), &stage_context(sink.clone()))
            .await
            .unwrap();

        assert_eq!(output, record);
        let assessed = sink.events_of_type("finalize.assessment");
        assert_eq!(assessed.len(), 1);
        assert_eq!(assessed[0].1.as_ref().unwrap()["assessment"], "assessed_clean");
        assert_eq!(
            assessed[0].1.as_ref().unwrap()["message"],
            "ASSESSMENT: File appears clean"
        );
    }

    #[tokio::test]
    async fn test_finalize_twice_gives_same_result() {
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = stage_context(sink.clone());
        let record = StateRecord::new("doc.pdf").with_report("malicious payload");

        let once = FinalizeStage::new().execute(record, &ctx).await.unwrap();
        let twice = FinalizeStage::new().execute(once.clone(), &ctx).await.unwrap();

        assert_eq!(once, twice);
        let assessed = sink.events_of_type("finalize.assessment");
        assert_eq!(assessed.len(), 2);
        assert_eq!(
            assessed[0].1.as_ref().unwrap()["assessment"],
            assessed[1].1.as_ref().unwrap()["assessment"]
        );
    }

    #[tokio::test]
    async fn test_finalize_warns_without_report() {
        for record in [
            StateRecord::new("doc.pdf"),
            StateRecord::new("doc.pdf").with_report(""),
            StateRecord::new("doc.pdf").with_report(NO_REPORT_SENTINEL),
        ] {
            let sink = Arc::new(CollectingEventSink::new());
            FinalizeStage::new()
                .execute(record, &stage_context(sink.clone()))
                .await
                .unwrap();

            let warnings = sink.events_of_type("finalize.warning");
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].1.as_ref().unwrap()["message"], NO_REPORT_SENTINEL);
            assert!(sink.events_of_type("finalize.assessment").is_empty());
        }
    }
}
