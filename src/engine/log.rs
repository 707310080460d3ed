//! Read-only view over one completion-log snapshot, keyed by habit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{CompletionEvent, HabitId};

/// Per-habit completion times parsed out of one log snapshot.
///
/// Malformed events (unparseable timestamps) are skipped and counted; one
/// bad record must not blank a user's entire streak history.
#[derive(Debug, Default)]
pub struct CompletionLog {
    by_habit: HashMap<HabitId, Vec<DateTime<Utc>>>,
    skipped: u32,
}

impl CompletionLog {
    /// Partition a fetched snapshot by habit id, parsing wire timestamps
    pub fn from_events(events: &[CompletionEvent]) -> Self {
        let mut log = Self::default();
        for event in events {
            match event.completed_time() {
                Ok(at) => log
                    .by_habit
                    .entry(event.habit_id.clone())
                    .or_default()
                    .push(at),
                Err(err) => {
                    warn!(habit_id = %event.habit_id, %err, "skipping malformed completion event");
                    log.skipped += 1;
                }
            }
        }
        log
    }

    /// Completion times recorded for a habit, in log order
    pub fn timestamps_for(&self, habit_id: &HabitId) -> &[DateTime<Utc>] {
        self.by_habit
            .get(habit_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of events dropped for malformed timestamps
    pub fn skipped(&self) -> u32 {
        self.skipped
    }
}
