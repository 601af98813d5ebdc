use chrono::{DateTime, Utc};

/// Per-run evaluation state. `now` is captured once so that every document in
/// a run sees the same `$$NOW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    now: DateTime<Utc>,
}

impl EvalContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Captures the wall clock.
    pub fn capture() -> Self {
        Self { now: Utc::now() }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
