//! Event sink system for run narration.
//!
//! Stages and the engine never print. They emit typed events to an
//! [`EventSink`], and the sink decides what a human (or a test) sees.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use parking_lot::RwLock;
use std::sync::Arc;

// Process-wide default sink, used when a context is not given one explicitly.
static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the current global event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the current global event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the current global event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_clear_sink() {
        clear_event_sink();
        get_event_sink().try_emit("ignored", None);

        let sink = Arc::new(CollectingEventSink::new());
        set_event_sink(sink.clone());
        get_event_sink().try_emit("test.event", Some(serde_json::json!({"key": "value"})));
        clear_event_sink();
        get_event_sink().try_emit("after.clear", None);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].0, "test.event");
    }
}
