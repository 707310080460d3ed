//! Completion events: the append-only log the engine aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CompletionId, DomainError, HabitId, UserId};

/// A record that a habit was performed at a point in time.
///
/// `completed_at` is kept in its RFC 3339 wire form exactly as the external
/// store returns it; [`CompletionEvent::completed_time`] parses it on demand.
/// Events are append-only and never mutated or deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Unique identifier for this event
    pub id: CompletionId,
    /// Which habit this completion is for
    pub habit_id: HabitId,
    /// Owner of the completion
    pub user_id: UserId,
    /// RFC 3339 timestamp of the completion, UTC
    pub completed_at: String,
}

impl CompletionEvent {
    /// Create an event stamped with the given completion time
    pub fn new(habit_id: HabitId, user_id: UserId, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: CompletionId::new(),
            habit_id,
            user_id,
            completed_at: completed_at.to_rfc3339(),
        }
    }

    /// Parse the wire timestamp.
    ///
    /// Fails on malformed input; callers on the aggregation path skip the
    /// event rather than abort the pass.
    pub fn completed_time(&self) -> Result<DateTime<Utc>, DomainError> {
        DateTime::parse_from_rfc3339(&self.completed_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| DomainError::MalformedTimestamp(self.completed_at.clone()))
    }
}
