//! # pdfhunt
//!
//! Orchestration engine for PDF threat analysis.
//!
//! A run threads a [`StateRecord`](context::StateRecord) through three stages:
//!
//! - **Validate**: checks the input path and assigns a run id
//! - **Analyze**: drives a nested [`AnalysisPipeline`](subpipeline::AnalysisPipeline)
//!   in incremental mode, narrates its snapshots, and writes the report artifacts
//! - **Finalize**: classifies the derived report and narrates the verdict
//!
//! The nested analysis itself lives outside this crate. It is reached through
//! the [`AnalysisPipeline`](subpipeline::AnalysisPipeline) trait, either in
//! process or as a child process speaking line-delimited JSON
//! ([`ProcessAnalysis`](subpipeline::ProcessAnalysis)).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pdfhunt::prelude::*;
//! use std::sync::Arc;
//!
//! let analysis = Arc::new(ProcessAnalysis::new("pdf-analyzer"));
//! let pipeline = analysis_pipeline(analysis, HuntConfig::default())
//!     .with_event_sink(Arc::new(LoggingEventSink::default()))
//!     .build()?;
//!
//! let record = pipeline.run_to_completion(StateRecord::new("sample.pdf")).await?;
//! println!("{}", record.report().unwrap_or_default());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod stages;
pub mod subpipeline;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::HuntConfig;
    pub use crate::context::{
        ExecutionContext, NestedState, PipelineContext, RunId, StageContext, StateRecord,
    };
    pub use crate::errors::{
        ArtifactError, HuntError, InputError, NestedPipelineError, PipelineValidationError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{analysis_pipeline, Pipeline, PipelineBuilder, StageUpdate};
    pub use crate::report::{MaterializedArtifacts, ReportMaterializer};
    pub use crate::stages::{classify, Assessment, DelegateStage, FinalizeStage, Stage, ValidateStage};
    pub use crate::subpipeline::{AnalysisPipeline, ProcessAnalysis, SnapshotStream};
}
