//! The nested analysis pipeline seam.
//!
//! The outer orchestrator never looks inside the analysis. It hands an
//! [`AnalysisPipeline`] the initial [`NestedState`] and pulls snapshots from the
//! returned stream until it ends. [`SnapshotFold`] turns that stream into
//! observations and a final [`DelegationSummary`].

mod fold;
mod process;

pub use fold::{preview_text, DelegationSummary, Observation, SnapshotFold, NO_REPORT_SENTINEL};
pub use process::ProcessAnalysis;

use crate::context::NestedState;
use crate::errors::NestedPipelineError;
use futures::stream::BoxStream;

/// A forward-only, single-pass stream of nested snapshots.
///
/// An `Err` item means the nested pipeline failed irrecoverably; consumers stop
/// at the first one.
pub type SnapshotStream<'a> = BoxStream<'a, Result<NestedState, NestedPipelineError>>;

/// A nested analysis pipeline driven in incremental mode.
pub trait AnalysisPipeline: Send + Sync {
    /// Returns the analysis name, used in narration.
    fn name(&self) -> &str;

    /// Starts a run from `initial` and returns its snapshot stream.
    ///
    /// The stream may be empty. It ends when the analysis sets its completion
    /// flag or exhausts its own iteration budget.
    fn stream(&self, initial: NestedState) -> SnapshotStream<'_>;
}
