//! Testing utilities for analysis runs.
//!
//! This module provides:
//! - A scripted nested pipeline and mock stages
//! - Fixtures for input files, snapshots and contexts
//! - Assertions over state records and narration

mod assertions;
mod fixtures;
mod mocks;

pub use crate::events::CollectingEventSink;
pub use assertions::{assert_completed_run, assert_events_in_order};
pub use fixtures::{snapshot, stage_context, write_pdf, MINIMAL_PDF};
pub use mocks::{FailingStage, RecordingStage, ScriptedAnalysis};
