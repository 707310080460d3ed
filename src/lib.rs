//! Streak aggregation engine for habit tracking.
//!
//! Consumes an external habit store (a habit list, an append-only
//! completion log and per-resource mutation notifications) and maintains a
//! ranked, queryable view of streak statistics per habit. [`StreakEngine`]
//! is the entry point: it runs one aggregation pass at startup, then a
//! change reactor keeps the view current as mutations arrive.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

// Internal modules
mod domain;
mod engine;
mod store;

// Re-export public modules and types
pub use domain::*;
pub use engine::{
    aggregate, CompletionLog, DuplicatePolicy, EngineConfig, RankedHabit, RankedView,
    LEADERBOARD_SIZE,
};
pub use store::{HabitStore, InMemoryStore, Mutation, MutationEvent, ResourceKind, StoreError};

/// Errors that can occur during engine operation
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("domain validation error: {0}")]
    Domain(#[from] DomainError),
}

/// Outcome of a completion submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The completion was appended to the log
    Logged {
        /// Streak for the habit including the new completion
        current_streak: u32,
    },
    /// Rejected: the habit already has a credit for the current UTC day
    AlreadyCompletedToday,
}

/// The streak-aggregation engine for one user.
///
/// [`StreakEngine::start`] fetches an initial snapshot, publishes the first
/// ranked view and spawns the change reactor; afterwards the view tracks
/// store mutations on its own. Reads always return the latest successfully
/// computed pass; a failed refresh leaves the previous view in place,
/// flagged stale.
pub struct StreakEngine {
    store: Arc<dyn HabitStore>,
    user_id: UserId,
    config: EngineConfig,
    view_rx: watch::Receiver<RankedView>,
    reactor: JoinHandle<()>,
}

impl StreakEngine {
    /// Start the engine for one user.
    ///
    /// Fails if the initial fetch fails; there is no previous view to fall
    /// back on yet. Later fetch failures degrade to a stale view instead.
    pub async fn start(
        store: Arc<dyn HabitStore>,
        user_id: UserId,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        // subscribe before the initial fetch so no mutation falls into the gap
        let habit_events = store.subscribe(ResourceKind::Habits, &user_id);
        let completion_events = store.subscribe(ResourceKind::Completions, &user_id);

        let habits = store.fetch_habits(&user_id).await?;
        let completions = store.fetch_completions(&user_id).await?;
        info!(
            habits = habits.len(),
            completions = completions.len(),
            "starting streak engine"
        );

        let (view_tx, view_rx) = watch::channel(aggregate(&habits, &completions));

        let reactor = engine::reactor::ChangeReactor::new(
            Arc::clone(&store),
            user_id.clone(),
            config.clone(),
            view_tx,
            habits,
            completions,
        );
        let reactor = tokio::spawn(reactor.run(habit_events, completion_events));

        Ok(Self {
            store,
            user_id,
            config,
            view_rx,
            reactor,
        })
    }

    /// The latest ranked view
    pub fn view(&self) -> RankedView {
        self.view_rx.borrow().clone()
    }

    /// All habits ordered by current streak, descending
    pub fn ranked_habits(&self) -> Vec<RankedHabit> {
        self.view_rx.borrow().ranked.clone()
    }

    /// Leading `n` habits of the current ranking
    pub fn top_n(&self, n: usize) -> Vec<RankedHabit> {
        self.view_rx.borrow().top(n).to_vec()
    }

    /// Watch the published view; the receiver resolves whenever a new pass
    /// lands.
    pub fn subscribe_view(&self) -> watch::Receiver<RankedView> {
        self.view_rx.clone()
    }

    /// Submit a completion for a habit.
    ///
    /// Applies the configured duplicate policy, appends to the log and
    /// refreshes the habit's cached display fields. The ranked view catches
    /// up through the change reactor.
    pub async fn record_completion(
        &self,
        habit_id: &HabitId,
    ) -> Result<RecordOutcome, EngineError> {
        let mut habit = self.store.get_habit(habit_id).await?;

        // the log, not the cached fields, decides whether today is taken
        let events = self.store.fetch_completions(&self.user_id).await?;
        let mut timestamps: Vec<_> = events
            .iter()
            .filter(|event| &event.habit_id == habit_id)
            .filter_map(|event| event.completed_time().ok())
            .collect();

        let now = Utc::now();
        if self.config.duplicate_policy == DuplicatePolicy::RejectSameDay {
            let today = now.date_naive();
            if timestamps.iter().any(|t| t.date_naive() == today) {
                return Ok(RecordOutcome::AlreadyCompletedToday);
            }
        }

        let event = CompletionEvent::new(habit_id.clone(), self.user_id.clone(), now);
        self.store.append_completion(&event).await?;

        habit.note_completion(now);
        self.store.update_habit(&habit).await?;

        timestamps.push(now);
        let streak = StreakResult::from_timestamps(habit_id.clone(), &timestamps);
        Ok(RecordOutcome::Logged {
            current_streak: streak.current,
        })
    }

    /// Stop the change reactor task
    pub async fn shutdown(mut self) {
        self.reactor.abort();
        let _ = (&mut self.reactor).await;
    }
}

impl Drop for StreakEngine {
    fn drop(&mut self) {
        self.reactor.abort();
    }
}
