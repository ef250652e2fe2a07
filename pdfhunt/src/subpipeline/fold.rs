//! Folding a snapshot stream into observations and a summary.

use crate::context::NestedState;
use serde_json::json;

/// Report text used when the nested pipeline produced no usable report.
pub const NO_REPORT_SENTINEL: &str = "No report generated";

/// Something worth narrating about the nested run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The highest iteration counter seen so far went up.
    IterationAdvanced {
        /// The new highest iteration.
        iteration: u64,
    },
    /// The findings collection grew past anything seen before.
    FindingsGrew {
        /// The new findings count.
        count: usize,
    },
    /// The snapshot carries a pending next action.
    NextAction {
        /// Display form, truncated.
        preview: String,
        /// The untruncated action.
        full: String,
    },
    /// The completion flag was seen set for the first time.
    Completed,
}

impl Observation {
    /// Returns the event type used to narrate this observation.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::IterationAdvanced { .. } => "analyze.iteration",
            Self::FindingsGrew { .. } => "analyze.findings",
            Self::NextAction { .. } => "analyze.next_action",
            Self::Completed => "analyze.completed_flag",
        }
    }

    /// Builds the event payload, including a human-readable `message`.
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        match self {
            Self::IterationAdvanced { iteration } => json!({
                "message": format!("Subgraph iteration {iteration}"),
                "iteration": iteration,
            }),
            Self::FindingsGrew { count } => json!({
                "message": format!("Found {count} security findings so far"),
                "count": count,
            }),
            Self::NextAction { preview, full } => json!({
                "message": format!("Executing: {preview}"),
                "action": full,
            }),
            Self::Completed => json!({"message": "Subgraph analysis completed"}),
        }
    }
}

/// Truncates `text` to at most `max_chars` characters, appending `...` when
/// anything was cut.
#[must_use]
pub fn preview_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Outcome of a drained nested run.
#[derive(Debug, Clone, PartialEq)]
pub struct DelegationSummary {
    /// The last snapshot seen, if any.
    pub terminal: Option<NestedState>,
    /// Report derived from the terminal snapshot, or [`NO_REPORT_SENTINEL`].
    pub derived_report: String,
    /// Findings in the terminal snapshot.
    pub findings_count: usize,
    /// Commands in the terminal snapshot.
    pub commands_count: usize,
    /// Highest iteration counter observed.
    pub highest_iteration: u64,
    /// Whether the completion flag was ever seen set.
    pub completed: bool,
    /// Number of snapshots consumed.
    pub snapshot_count: usize,
}

/// Incremental consumer of a nested snapshot stream.
///
/// Tracked maxima never decrease, even if a snapshot reports a lower
/// iteration or fewer findings than an earlier one.
#[derive(Debug, Clone)]
pub struct SnapshotFold {
    preview_chars: usize,
    highest_iteration: u64,
    findings_seen: usize,
    completed: bool,
    snapshot_count: usize,
    latest: Option<NestedState>,
}

impl SnapshotFold {
    /// Creates a fold that truncates action previews to `preview_chars`.
    #[must_use]
    pub fn new(preview_chars: usize) -> Self {
        Self {
            preview_chars,
            highest_iteration: 0,
            findings_seen: 0,
            completed: false,
            snapshot_count: 0,
            latest: None,
        }
    }

    /// Consumes one snapshot and returns what it changed.
    pub fn observe(&mut self, snapshot: NestedState) -> Vec<Observation> {
        let mut observations = Vec::new();

        let iteration = snapshot.current_iteration();
        if iteration > self.highest_iteration {
            self.highest_iteration = iteration;
            observations.push(Observation::IterationAdvanced { iteration });
        }

        let findings = snapshot.findings_len();
        if findings > self.findings_seen {
            self.findings_seen = findings;
            observations.push(Observation::FindingsGrew { count: findings });
        }

        if let Some(action) = snapshot.next_action() {
            observations.push(Observation::NextAction {
                preview: preview_text(action, self.preview_chars),
                full: action.to_string(),
            });
        }

        if snapshot.is_complete() && !self.completed {
            self.completed = true;
            observations.push(Observation::Completed);
        }

        self.snapshot_count += 1;
        self.latest = Some(snapshot);
        observations
    }

    /// Highest iteration counter seen so far.
    #[must_use]
    pub fn highest_iteration(&self) -> u64 {
        self.highest_iteration
    }

    /// Largest findings count seen so far.
    #[must_use]
    pub fn findings_seen(&self) -> usize {
        self.findings_seen
    }

    /// Whether the completion flag has been seen.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Number of snapshots consumed.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshot_count
    }

    /// Ends the fold and derives the run summary from the terminal snapshot.
    #[must_use]
    pub fn finish(self) -> DelegationSummary {
        let derived_report = self
            .latest
            .as_ref()
            .and_then(NestedState::final_report)
            .unwrap_or(NO_REPORT_SENTINEL)
            .to_string();
        let findings_count = self.latest.as_ref().map_or(0, NestedState::findings_len);
        let commands_count = self.latest.as_ref().map_or(0, NestedState::commands_len);

        DelegationSummary {
            terminal: self.latest,
            derived_report,
            findings_count,
            commands_count,
            highest_iteration: self.highest_iteration,
            completed: self.completed,
            snapshot_count: self.snapshot_count,
        }
    }
}
