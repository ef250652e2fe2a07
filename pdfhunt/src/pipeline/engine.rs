//! Sequential pipeline execution engine.
//!
//! Stages run strictly one after another. The first error stops the run: no
//! downstream stage executes and the error is handed to the caller unchanged.

use crate::context::{ExecutionContext, PipelineContext, StateRecord};
use crate::errors::HuntError;
use crate::observability::{SpanTimer, StageSpanAttributes};
use crate::stages::Stage;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Progress item of an incremental run: the record right after a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageUpdate {
    /// Name of the stage that just completed.
    pub stage: String,
    /// Zero-based position of that stage.
    pub index: usize,
    /// The record the stage produced.
    pub record: StateRecord,
}

/// A built, validated linear pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    ctx: Arc<PipelineContext>,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub(crate) fn new(ctx: Arc<PipelineContext>, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { ctx, stages }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.ctx.pipeline_name()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the shared pipeline context.
    #[must_use]
    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.ctx
    }

    /// Runs every stage and returns the last stage's output.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub async fn run_to_completion(&self, initial: StateRecord) -> Result<StateRecord, HuntError> {
        let mut updates = self.run_incremental(initial.clone());
        let mut last = initial;
        while let Some(update) = updates.next().await {
            last = update?.record;
        }
        Ok(last)
    }

    /// Runs the pipeline lazily, yielding one update per completed stage.
    ///
    /// Nothing executes until the stream is polled. After an error item the
    /// stream ends.
    pub fn run_incremental(&self, initial: StateRecord) -> BoxStream<'_, Result<StageUpdate, HuntError>> {
        stream::unfold(Some((initial, 0_usize)), move |state| async move {
            let Some((record, index)) = state else {
                return None;
            };
            let Some(stage) = self.stages.get(index) else {
                return None;
            };

            if index == 0 {
                self.ctx.try_emit_event(
                    "pipeline.started",
                    Some(json!({"stages": self.stage_names()})),
                );
            }

            match self.run_stage(index, stage.as_ref(), record).await {
                Ok(next) => {
                    let update = StageUpdate {
                        stage: stage.name().to_string(),
                        index,
                        record: next.clone(),
                    };
                    let following = if index + 1 < self.stages.len() {
                        Some((next, index + 1))
                    } else {
                        self.ctx.try_emit_event(
                            "pipeline.completed",
                            Some(json!({"stages": self.stages.len()})),
                        );
                        None
                    };
                    Some((Ok(update), following))
                }
                Err(err) => {
                    self.ctx.try_emit_event(
                        "pipeline.failed",
                        Some(json!({
                            "message": format!("Pipeline stopped at stage '{}'", stage.name()),
                            "stage": stage.name(),
                            "error": err.to_dict(),
                        })),
                    );
                    Some((Err(err), None))
                }
            }
        })
        .boxed()
    }

    async fn run_stage(
        &self,
        index: usize,
        stage: &dyn Stage,
        record: StateRecord,
    ) -> Result<StateRecord, HuntError> {
        let name = stage.name();
        let stage_ctx = self.ctx.for_stage(name);
        let timer = SpanTimer::start(name);

        self.ctx.try_emit_event(
            "stage.started",
            Some(StageSpanAttributes::new(name, index).to_event_data()),
        );

        let previous = record.clone();
        let result = stage
            .execute(record, &stage_ctx)
            .await
            .and_then(|next| previous.check_successor(&next, name).map(|()| next));
        let duration_ms = timer.finish();

        match result {
            Ok(next) => {
                debug!(stage = name, duration_ms, "Stage completed");
                self.ctx.try_emit_event(
                    "stage.completed",
                    Some(
                        StageSpanAttributes::new(name, index)
                            .with_status("completed")
                            .with_duration_ms(duration_ms)
                            .to_event_data(),
                    ),
                );
                Ok(next)
            }
            Err(err) => {
                warn!(stage = name, error = %err, "Stage failed");
                self.ctx.try_emit_event(
                    "stage.failed",
                    Some(
                        StageSpanAttributes::new(name, index)
                            .with_status("failed")
                            .with_duration_ms(duration_ms)
                            .with_error(err.to_string())
                            .to_event_data(),
                    ),
                );
                Err(err)
            }
        }
    }
}
