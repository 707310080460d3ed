//! Change reactor: turns mutation signals into aggregation passes.
//!
//! A single consumer loop owns the latest habit and completion snapshots.
//! The first signal opens a quiet window; anything arriving inside it only
//! marks the affected resource dirty, and one pass then re-fetches the
//! dirty resources, recomputes, and publishes. Signals arriving while a
//! pass runs sit in the channel and schedule the follow-up pass, so the
//! final published view always reflects the latest store state.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{CompletionEvent, Habit, UserId};
use crate::engine::aggregator::{aggregate, RankedView};
use crate::engine::EngineConfig;
use crate::store::{HabitStore, MutationEvent};

pub(crate) struct ChangeReactor {
    store: Arc<dyn HabitStore>,
    user_id: UserId,
    config: EngineConfig,
    publisher: watch::Sender<RankedView>,
    habits: Vec<Habit>,
    completions: Vec<CompletionEvent>,
    // dirty flags survive a failed pass so the next signal retries the fetch
    habits_dirty: bool,
    completions_dirty: bool,
}

impl ChangeReactor {
    pub(crate) fn new(
        store: Arc<dyn HabitStore>,
        user_id: UserId,
        config: EngineConfig,
        publisher: watch::Sender<RankedView>,
        habits: Vec<Habit>,
        completions: Vec<CompletionEvent>,
    ) -> Self {
        Self {
            store,
            user_id,
            config,
            publisher,
            habits,
            completions,
            habits_dirty: false,
            completions_dirty: false,
        }
    }

    /// Consume both subscription streams until one closes (store shutdown)
    pub(crate) async fn run(
        mut self,
        habit_events: BoxStream<'static, MutationEvent>,
        completion_events: BoxStream<'static, MutationEvent>,
    ) {
        // a terminated stream must stay pollable inside select!
        let mut habit_events = habit_events.fuse();
        let mut completion_events = completion_events.fuse();

        'idle: loop {
            // Idle: block until a mutation signal arrives
            tokio::select! {
                event = habit_events.next() => match event {
                    Some(_) => self.habits_dirty = true,
                    None => break 'idle,
                },
                event = completion_events.next() => match event {
                    Some(_) => self.completions_dirty = true,
                    None => break 'idle,
                },
            }

            // Quiet window: coalesce further signals into this pass
            let deadline = tokio::time::sleep(self.config.debounce);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    event = habit_events.next() => match event {
                        Some(_) => self.habits_dirty = true,
                        None => break,
                    },
                    event = completion_events.next() => match event {
                        Some(_) => self.completions_dirty = true,
                        None => break,
                    },
                }
            }

            self.refresh().await;
        }

        info!("mutation stream closed, change reactor stopping");
    }

    /// One pass: re-fetch dirty resources, aggregate, publish.
    ///
    /// A failed fetch keeps the previous snapshots and flags the retained
    /// view stale instead of aborting (stale-but-available).
    async fn refresh(&mut self) {
        if self.habits_dirty {
            match self.store.fetch_habits(&self.user_id).await {
                Ok(habits) => {
                    self.habits = habits;
                    self.habits_dirty = false;
                }
                Err(err) => {
                    warn!(%err, "habit fetch failed, keeping previous ranked view");
                    self.mark_stale();
                    return;
                }
            }
        }
        if self.completions_dirty {
            match self.store.fetch_completions(&self.user_id).await {
                Ok(completions) => {
                    self.completions = completions;
                    self.completions_dirty = false;
                }
                Err(err) => {
                    warn!(%err, "completion fetch failed, keeping previous ranked view");
                    self.mark_stale();
                    return;
                }
            }
        }

        let view = aggregate(&self.habits, &self.completions);
        debug!(
            habits = view.ranked.len(),
            skipped = view.skipped_events,
            "published ranked view"
        );
        self.publisher.send_replace(view);
    }

    fn mark_stale(&self) {
        self.publisher.send_modify(|view| view.is_stale = true);
    }
}
