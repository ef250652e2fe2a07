//! Test assertions for state records and narration.

use crate::context::StateRecord;
use crate::events::CollectingEventSink;

/// Asserts that the record went through a successful run.
pub fn assert_completed_run(record: &StateRecord) {
    let run_id = record.run_id();
    assert!(
        run_id.is_some_and(|id| !id.as_str().is_empty()),
        "Expected a non-empty run_id, got {run_id:?}"
    );
    assert!(
        record.report().is_some(),
        "Expected a report, record is {:?}",
        record.to_dict()
    );
}

/// Asserts that `expected` event types appear in order, ignoring others.
pub fn assert_events_in_order(sink: &CollectingEventSink, expected: &[&str]) {
    let actual = sink.event_types();
    let mut remaining = expected.iter().peekable();
    for event_type in &actual {
        if remaining.peek().is_some_and(|next| **next == event_type.as_str()) {
            remaining.next();
        }
    }
    let missing: Vec<_> = remaining.collect();
    assert!(
        missing.is_empty(),
        "Events {missing:?} missing or out of order in {actual:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunId;
    use crate::events::EventSink;

    #[test]
    fn test_assert_completed_run() {
        let record = StateRecord::new("a.pdf")
            .with_run_id(RunId::new("abcd1234").unwrap())
            .with_report("clean");
        assert_completed_run(&record);
    }

    #[test]
    #[should_panic(expected = "Expected a report")]
    fn test_assert_completed_run_without_report() {
        let record = StateRecord::new("a.pdf").with_run_id(RunId::new("abcd1234").unwrap());
        assert_completed_run(&record);
    }

    #[test]
    fn test_assert_events_in_order() {
        let sink = CollectingEventSink::new();
        for event_type in ["a", "x", "b", "c"] {
            sink.try_emit(event_type, None);
        }
        assert_events_in_order(&sink, &["a", "b", "c"]);
    }

    #[test]
    #[should_panic(expected = "missing or out of order")]
    fn test_assert_events_out_of_order() {
        let sink = CollectingEventSink::new();
        sink.try_emit("b", None);
        sink.try_emit("a", None);
        assert_events_in_order(&sink, &["a", "b"]);
    }
}
