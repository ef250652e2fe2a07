//! Mock nested pipelines and stages for testing.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use crate::context::{NestedState, StageContext, StateRecord};
use crate::errors::{HuntError, NestedPipelineError};
use crate::stages::Stage;
use crate::subpipeline::{AnalysisPipeline, SnapshotStream};

/// A nested pipeline that replays a fixed list of snapshots.
///
/// Records every initial record it is started with.
#[derive(Debug)]
pub struct ScriptedAnalysis {
    snapshots: Vec<NestedState>,
    failure: Option<(usize, String)>,
    initials: Mutex<Vec<NestedState>>,
}

impl ScriptedAnalysis {
    /// Creates a pipeline that yields `snapshots` in order.
    #[must_use]
    pub fn new(snapshots: Vec<NestedState>) -> Self {
        Self {
            snapshots,
            failure: None,
            initials: Mutex::new(Vec::new()),
        }
    }

    /// Fails with `message` after yielding `after` snapshots.
    #[must_use]
    pub fn failing_after(mut self, after: usize, message: impl Into<String>) -> Self {
        self.failure = Some((after, message.into()));
        self
    }

    /// Returns how many times the pipeline was started.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.initials.lock().len()
    }

    /// Returns the initial record of the most recent start.
    #[must_use]
    pub fn last_initial(&self) -> Option<NestedState> {
        self.initials.lock().last().cloned()
    }
}

impl AnalysisPipeline for ScriptedAnalysis {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, initial: NestedState) -> SnapshotStream<'_> {
        self.initials.lock().push(initial);

        let items: Vec<Result<NestedState, NestedPipelineError>> = match self.failure {
            Some((after, ref message)) => self
                .snapshots
                .iter()
                .take(after)
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(NestedPipelineError::failed(message.clone()))))
                .collect(),
            None => self.snapshots.iter().cloned().map(Ok).collect(),
        };
        stream::iter(items).boxed()
    }
}

/// A stage that always fails with a nested pipeline error.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    error: String,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _record: StateRecord,
        _ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        Err(NestedPipelineError::failed(self.error.clone()).into())
    }
}

/// A stage that records every record it receives and passes it on.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    received: Mutex<Vec<StateRecord>>,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Returns all received records.
    #[must_use]
    pub fn received(&self) -> Vec<StateRecord> {
        self.received.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.received.lock().len()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        record: StateRecord,
        _ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        self.received.lock().push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{snapshot, stage_context};
    use std::path::Path;

    #[tokio::test]
    async fn test_scripted_analysis_replays() {
        let analysis = ScriptedAnalysis::new(vec![snapshot(1, 0), snapshot(2, 1)]);
        let initial = NestedState::initial(Path::new("a.pdf"), 5);

        let items: Vec<_> = analysis.stream(initial.clone()).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Result::is_ok));
        assert_eq!(analysis.calls(), 1);
        assert_eq!(analysis.last_initial(), Some(initial));
    }

    #[tokio::test]
    async fn test_scripted_analysis_failure() {
        let analysis = ScriptedAnalysis::new(vec![snapshot(1, 0), snapshot(2, 1)])
            .failing_after(1, "boom");

        let items: Vec<_> = analysis
            .stream(NestedState::default())
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(NestedPipelineError::Failed(ref m)) if m == "boom"));
    }

    #[tokio::test]
    async fn test_failing_stage() {
        let stage = FailingStage::new("fail", "test error");
        let err = stage
            .execute(StateRecord::new("a.pdf"), &stage_context("fail"))
            .await
            .unwrap_err();
        assert!(matches!(err, HuntError::Nested(_)));
    }

    #[tokio::test]
    async fn test_recording_stage() {
        let stage = RecordingStage::new("record");
        let ctx = stage_context("record");

        stage.execute(StateRecord::new("a.pdf"), &ctx).await.unwrap();
        stage.execute(StateRecord::new("b.pdf"), &ctx).await.unwrap();

        assert_eq!(stage.execution_count(), 2);
        assert_eq!(stage.received()[1].input_path(), Path::new("b.pdf"));
    }
}
