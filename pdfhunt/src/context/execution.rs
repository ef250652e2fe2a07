//! Execution contexts handed to the engine and its stages.

use crate::config::HuntConfig;
use crate::events::{get_event_sink, EventSink};
use std::sync::Arc;

/// Trait unifying pipeline and stage context behaviors.
pub trait ExecutionContext: Send + Sync {
    /// Returns the pipeline name.
    fn pipeline_name(&self) -> &str;

    /// Tries to emit an event. Never fails.
    fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// Shared context for one pipeline execution.
pub struct PipelineContext {
    /// Pipeline name.
    pipeline_name: String,
    /// Run configuration.
    config: Arc<HuntConfig>,
    /// Event sink for narration.
    event_sink: Arc<dyn EventSink>,
}

impl PipelineContext {
    /// Creates a context using the global event sink.
    #[must_use]
    pub fn new(pipeline_name: impl Into<String>, config: Arc<HuntConfig>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            config,
            event_sink: get_event_sink(),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    /// Creates the context for one stage invocation.
    #[must_use]
    pub fn for_stage(self: &Arc<Self>, stage_name: impl Into<String>) -> StageContext {
        StageContext::new(Arc::clone(self), stage_name)
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("pipeline_name", &self.pipeline_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext for PipelineContext {
    fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));
        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert("pipeline".to_string(), serde_json::json!(&self.pipeline_name));
            map.insert(
                "timestamp".to_string(),
                serde_json::json!(crate::utils::iso_timestamp()),
            );
        }
        self.event_sink.try_emit(event_type, Some(enriched));
    }
}

/// Context for a single stage invocation.
#[derive(Debug, Clone)]
pub struct StageContext {
    pipeline_ctx: Arc<PipelineContext>,
    stage_name: String,
}

impl StageContext {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(pipeline_ctx: Arc<PipelineContext>, stage_name: impl Into<String>) -> Self {
        Self {
            pipeline_ctx,
            stage_name: stage_name.into(),
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &HuntConfig {
        self.pipeline_ctx.config()
    }
}

impl ExecutionContext for StageContext {
    fn pipeline_name(&self) -> &str {
        self.pipeline_ctx.pipeline_name()
    }

    fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut enriched = data.unwrap_or_else(|| serde_json::json!({}));
        if let serde_json::Value::Object(ref mut map) = enriched {
            map.insert("stage".to_string(), serde_json::json!(&self.stage_name));
        }
        self.pipeline_ctx.try_emit_event(event_type, Some(enriched));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;

    #[test]
    fn test_stage_context_enriches_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = Arc::new(
            PipelineContext::new("hunt", Arc::new(HuntConfig::default()))
                .with_event_sink(sink.clone()),
        );
        let stage_ctx = ctx.for_stage("validate");

        stage_ctx.try_emit_event("validate.passed", Some(serde_json::json!({"file": "a.pdf"})));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let (event_type, data) = &events[0];
        assert_eq!(event_type, "validate.passed");
        let data = data.as_ref().unwrap();
        assert_eq!(data["stage"], "validate");
        assert_eq!(data["pipeline"], "hunt");
        assert_eq!(data["file"], "a.pdf");
        assert!(data["timestamp"].is_string());
    }

    #[test]
    fn test_stage_context_exposes_config() {
        let config = HuntConfig::default().with_max_iterations(3);
        let ctx = Arc::new(PipelineContext::new("hunt", Arc::new(config)));
        assert_eq!(ctx.for_stage("analyze").config().max_iterations, 3);
    }
}
