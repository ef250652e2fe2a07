//! Observability utilities.

mod logging;
mod tracing;

pub use logging::init_tracing;
pub use tracing::{SpanTimer, StageSpanAttributes};
