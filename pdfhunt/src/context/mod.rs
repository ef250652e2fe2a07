//! Records and contexts for pipeline execution.
//!
//! This module provides:
//! - [`StateRecord`], the value threaded through the outer pipeline
//! - [`NestedState`], the opaque record of the nested analysis pipeline
//! - [`RunId`], the short token naming a run's artifacts
//! - Pipeline and stage execution contexts

mod execution;
mod identity;
pub mod nested;
mod record;

pub use execution::{ExecutionContext, PipelineContext, StageContext};
pub use identity::RunId;
pub use nested::NestedState;
pub use record::StateRecord;
