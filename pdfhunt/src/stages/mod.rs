//! Stage trait and the stages of the analysis pipeline.
//!
//! A stage takes the [`StateRecord`] by value and returns the next record.
//! Returning an error aborts the whole run.

mod delegate;
mod finalize;
mod validate;

pub use delegate::DelegateStage;
pub use finalize::{classify, Assessment, FinalizeStage};
pub use validate::{check_input, ValidateStage};

use crate::context::{StageContext, StateRecord};
use crate::errors::HuntError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage.
    ///
    /// # Arguments
    ///
    /// * `record` - The record produced by the previous stage
    /// * `ctx` - The stage execution context
    ///
    /// # Returns
    ///
    /// The successor record, or an error that aborts the run.
    async fn execute(&self, record: StateRecord, ctx: &StageContext)
        -> Result<StateRecord, HuntError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(StateRecord, &StageContext) -> Result<StateRecord, HuntError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(StateRecord, &StageContext) -> Result<StateRecord, HuntError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(StateRecord, &StageContext) -> Result<StateRecord, HuntError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(StateRecord, &StageContext) -> Result<StateRecord, HuntError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        record: StateRecord,
        ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        (self.func)(record, ctx)
    }
}

/// A stage that returns its input unchanged.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        record: StateRecord,
        _ctx: &StageContext,
    ) -> Result<StateRecord, HuntError> {
        Ok(record)
    }
}
