//! Pipeline building and execution.
//!
//! This module provides:
//! - A builder that validates stage lists
//! - A sequential engine with run-to-completion and incremental modes
//! - The standard validate, analyze, finalize pipeline

mod builder;
mod engine;

pub use builder::PipelineBuilder;
pub use engine::{Pipeline, StageUpdate};

use crate::config::HuntConfig;
use crate::errors::PipelineValidationError;
use crate::stages::{DelegateStage, FinalizeStage, ValidateStage};
use crate::subpipeline::AnalysisPipeline;
use std::sync::Arc;

/// Name of the standard analysis pipeline.
pub const ANALYSIS_PIPELINE_NAME: &str = "pdf_threat_hunt";

/// Returns a builder preloaded with the validate, analyze and finalize stages.
#[must_use]
pub fn analysis_pipeline(
    analysis: Arc<dyn AnalysisPipeline>,
    config: impl Into<Arc<HuntConfig>>,
) -> PipelineBuilder {
    PipelineBuilder::new(ANALYSIS_PIPELINE_NAME)
        .with_config(config)
        .stage(Arc::new(ValidateStage::new()))
        .stage(Arc::new(DelegateStage::new(analysis)))
        .stage(Arc::new(FinalizeStage::new()))
}

/// Builds the standard analysis pipeline with the global event sink.
///
/// # Errors
///
/// Never fails for the standard stages; kept fallible to match
/// [`PipelineBuilder::build`].
pub fn build_analysis_pipeline(
    analysis: Arc<dyn AnalysisPipeline>,
    config: impl Into<Arc<HuntConfig>>,
) -> Result<Pipeline, PipelineValidationError> {
    analysis_pipeline(analysis, config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedAnalysis;

    #[test]
    fn test_analysis_pipeline_stage_order() {
        let pipeline = build_analysis_pipeline(
            Arc::new(ScriptedAnalysis::new(Vec::new())),
            HuntConfig::default(),
        )
        .unwrap();

        assert_eq!(pipeline.name(), ANALYSIS_PIPELINE_NAME);
        assert_eq!(pipeline.stage_names(), vec!["validate", "analyze", "finalize"]);
    }
}
