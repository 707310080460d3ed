//! Streak calculation.
//!
//! `StreakResult` holds the derived streak statistics for one habit, and
//! [`StreakResult::from_timestamps`] is the pure calculator that produces
//! them from the habit's completion times.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::HabitId;

/// Gap tolerance between consecutive completions, in days.
///
/// Fixed policy constant: completions up to a day and a half apart extend
/// the same run, so a streak survives a late log one day followed by an
/// early log the next.
pub const STREAK_GAP_TOLERANCE_DAYS: f64 = 1.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Derived streak statistics for a habit.
///
/// Recomputed wholesale on every aggregation pass and never persisted.
/// For every input, `best >= current` and `total >= current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResult {
    /// Which habit this streak data is for
    pub habit_id: HabitId,
    /// Length of the consecutive run ending at the most recent completion
    pub current: u32,
    /// Longest consecutive run anywhere in the history
    pub best: u32,
    /// Total number of recorded completions
    pub total: u32,
}

impl StreakResult {
    /// Zero-valued result for a habit with no completions
    pub fn empty(habit_id: HabitId) -> Self {
        Self {
            habit_id,
            current: 0,
            best: 0,
            total: 0,
        }
    }

    /// Compute streak statistics from a habit's completion times.
    ///
    /// The input does not need to be pre-sorted. Two completions extend the
    /// same run when they are at most [`STREAK_GAP_TOLERANCE_DAYS`] apart;
    /// identical timestamps (gap zero) therefore both count. The current
    /// streak is the run ending at the chronologically latest completion,
    /// which is not necessarily the best run.
    pub fn from_timestamps(habit_id: HabitId, timestamps: &[DateTime<Utc>]) -> Self {
        if timestamps.is_empty() {
            return Self::empty(habit_id);
        }

        // Stable sort; ties keep input order, which cannot affect the
        // output since only gaps matter.
        let mut sorted = timestamps.to_vec();
        sorted.sort();

        let total = sorted.len() as u32;
        let mut running = 1u32;
        let mut best = 1u32;

        for pair in sorted.windows(2) {
            let gap_days = (pair[1] - pair[0]).num_milliseconds() as f64 / MILLIS_PER_DAY;
            if gap_days <= STREAK_GAP_TOLERANCE_DAYS {
                running += 1;
            } else {
                running = 1;
            }
            best = best.max(running);
        }

        Self {
            habit_id,
            current: running,
            best,
            total,
        }
    }
}
