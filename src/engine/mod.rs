//! The aggregation engine: completion-log view, aggregator and change
//! reactor, plus the engine configuration.

pub mod aggregator;
pub mod log;
pub mod reactor;

// Re-export public types for easy access
pub use aggregator::{aggregate, RankedHabit, RankedView, LEADERBOARD_SIZE};
pub use log::CompletionLog;

use std::time::Duration;

/// How duplicate completions on the same day are treated by the
/// submission path.
///
/// The streak calculator itself always counts every logged event; this
/// policy decides whether a same-day submission reaches the log at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// At most one credited completion per habit per UTC calendar day
    RejectSameDay,
    /// Every submission is credited
    AllowMultiple,
}

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet window after a change signal before a refresh pass runs.
    /// Further signals inside the window coalesce into the same pass.
    pub debounce: Duration,
    /// Same-day duplicate handling for `record_completion`
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            duplicate_policy: DuplicatePolicy::RejectSameDay,
        }
    }
}
