//! Execution trace events.
//!
//! The trace is an ordered, deterministic artifact: tests may compare
//! it byte for byte after JSON serialization.

use serde::Serialize;

/// One trace event: monotonically increasing step, event kind and a
/// short detail string.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceEvent {
    pub step: u64,
    pub kind: String,
    pub detail: String,
}

#[derive(Default)]
pub(crate) struct Trace {
    events: Vec<TraceEvent>,
    next_step: u64,
}

impl Trace {
    pub(crate) fn record(&mut self, kind: &str, detail: impl Into<String>) {
        self.next_step += 1;
        self.events.push(TraceEvent {
            step: self.next_step,
            kind: kind.to_string(),
            detail: detail.into(),
        });
    }

    pub(crate) fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}
