//! Stage timing and span attributes.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Attributes describing one stage execution, used as event payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Stage name.
    pub stage_name: String,
    /// Zero-based position of the stage in the pipeline.
    pub index: usize,
    /// Stage status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageSpanAttributes {
    /// Creates new stage span attributes.
    #[must_use]
    pub fn new(stage_name: impl Into<String>, index: usize) -> Self {
        Self {
            stage_name: stage_name.into(),
            index,
            ..Default::default()
        }
    }

    /// Sets the stage status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Converts to an event payload.
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        let mut data = serde_json::json!({
            "stage": &self.stage_name,
            "index": self.index,
        });
        if let serde_json::Value::Object(ref mut map) = data {
            if let Some(ref status) = self.status {
                map.insert("status".to_string(), serde_json::json!(status));
            }
            if let Some(duration_ms) = self.duration_ms {
                map.insert("duration_ms".to_string(), serde_json::json!(duration_ms));
            }
            if let Some(ref error) = self.error {
                map.insert("error".to_string(), serde_json::json!(error));
            }
        }
        data
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        let duration_ms = self.elapsed_ms();
        tracing::trace!(span_name = %self.name, duration_ms, "Span finished");
        duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_span_attributes_payload() {
        let attrs = StageSpanAttributes::new("validate", 0)
            .with_status("completed")
            .with_duration_ms(12.5);

        let data = attrs.to_event_data();
        assert_eq!(data["stage"], "validate");
        assert_eq!(data["index"], 0);
        assert_eq!(data["status"], "completed");
        assert_eq!(data["duration_ms"], 12.5);
        assert!(data.get("error").is_none());
    }

    #[test]
    fn test_stage_span_attributes_error() {
        let data = StageSpanAttributes::new("analyze", 1)
            .with_status("failed")
            .with_error("boom")
            .to_event_data();
        assert_eq!(data["error"], "boom");
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("test_span");
        assert_eq!(timer.name(), "test_span");
        std::thread::sleep(std::time::Duration::from_millis(10));
        let duration = timer.finish();
        assert!(duration >= 10.0);
    }
}
