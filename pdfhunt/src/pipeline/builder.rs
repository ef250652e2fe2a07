//! Pipeline builder with validation.

use super::Pipeline;
use crate::config::HuntConfig;
use crate::context::PipelineContext;
use crate::errors::PipelineValidationError;
use crate::events::EventSink;
use crate::stages::Stage;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for creating validated linear pipelines.
#[derive(Clone)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// Stages in execution order.
    stages: Vec<Arc<dyn Stage>>,
    /// Run configuration shared by all stages.
    config: Arc<HuntConfig>,
    /// Narration sink; the global sink when unset.
    event_sink: Option<Arc<dyn EventSink>>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            config: Arc::new(HuntConfig::default()),
            event_sink: None,
        }
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the run configuration.
    #[must_use]
    pub fn with_config(mut self, config: impl Into<Arc<HuntConfig>>) -> Self {
        self.config = config.into();
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages or two stages share a name.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new(format!(
                "Pipeline '{}' has no stages",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name()) {
                return Err(PipelineValidationError::new(format!(
                    "Duplicate stage name '{}'",
                    stage.name()
                ))
                .with_stages(vec![stage.name().to_string()]));
            }
        }

        let mut ctx = PipelineContext::new(self.name, self.config);
        if let Some(sink) = self.event_sink {
            ctx = ctx.with_event_sink(sink);
        }
        Ok(Pipeline::new(Arc::new(ctx), self.stages))
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
