//! One-pass aggregation of habits and completions into a ranked view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CompletionEvent, Habit, HabitId, StreakResult};
use crate::engine::log::CompletionLog;

/// Number of habits on the leaderboard prefix
pub const LEADERBOARD_SIZE: usize = 3;

/// A habit paired with its streak statistics for one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHabit {
    pub habit: Habit,
    pub streak: StreakResult,
}

/// The published result of one aggregation pass.
///
/// The leaderboard is a prefix of `ranked`, so both displays always come
/// from the same snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RankedView {
    /// All habits, descending by current streak; ties keep fetch order
    pub ranked: Vec<RankedHabit>,
    /// When this pass ran
    pub generated_at: DateTime<Utc>,
    /// Set when the last refresh failed and this view is a retained older pass
    pub is_stale: bool,
    /// Completion events dropped for malformed timestamps during this pass
    pub skipped_events: u32,
}

impl RankedView {
    /// Leading `n` habits of the ranking
    pub fn top(&self, n: usize) -> &[RankedHabit] {
        &self.ranked[..self.ranked.len().min(n)]
    }

    /// The top-[`LEADERBOARD_SIZE`] prefix
    pub fn leaderboard(&self) -> &[RankedHabit] {
        self.top(LEADERBOARD_SIZE)
    }

    /// Look up one habit's entry by id
    pub fn get(&self, habit_id: &HabitId) -> Option<&RankedHabit> {
        self.ranked.iter().find(|entry| &entry.habit.id == habit_id)
    }
}

/// Run the streak calculator over every habit and rank the results.
///
/// Habits are mutually independent; each habit's timestamps go through the
/// calculator on their own. The sort is stable and keyed on current streak
/// only, so reruns over an unchanged snapshot produce identical order.
pub fn aggregate(habits: &[Habit], events: &[CompletionEvent]) -> RankedView {
    let log = CompletionLog::from_events(events);

    let mut ranked: Vec<RankedHabit> = habits
        .iter()
        .map(|habit| RankedHabit {
            streak: StreakResult::from_timestamps(
                habit.id.clone(),
                log.timestamps_for(&habit.id),
            ),
            habit: habit.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| b.streak.current.cmp(&a.streak.current));

    RankedView {
        ranked,
        generated_at: Utc::now(),
        is_stale: false,
        skipped_events: log.skipped(),
    }
}
