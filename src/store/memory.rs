//! In-memory implementation of the habit store.
//!
//! Stands in for the external backend in tests and the demo binary. State
//! lives behind an async RwLock; every mutation fans out a [`MutationEvent`]
//! on the broadcast channel of the matching resource.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::{broadcast, RwLock};
use tracing::warn;

use crate::domain::{CompletionEvent, Habit, HabitId, UserId};
use crate::store::{HabitStore, Mutation, MutationEvent, ResourceKind, StoreError};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct State {
    habits: Vec<Habit>,
    completions: Vec<CompletionEvent>,
}

/// In-process [`HabitStore`] backed by vectors and broadcast channels
pub struct InMemoryStore {
    state: RwLock<State>,
    habit_tx: broadcast::Sender<MutationEvent>,
    completion_tx: broadcast::Sender<MutationEvent>,
    fail_fetches: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (habit_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (completion_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(State::default()),
            habit_tx,
            completion_tx,
            fail_fetches: AtomicBool::new(false),
        }
    }

    /// Make subsequent fetches fail with a transport error.
    ///
    /// Lets callers drive the engine's fail-soft path without a real
    /// network between them.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(
                "simulated transport failure".to_string(),
            ));
        }
        Ok(())
    }

    fn notify(&self, resource: ResourceKind, mutation: Mutation, user_id: &UserId) {
        let tx = match resource {
            ResourceKind::Habits => &self.habit_tx,
            ResourceKind::Completions => &self.completion_tx,
        };
        // send only fails when nobody is subscribed
        let _ = tx.send(MutationEvent {
            resource,
            mutation,
            user_id: user_id.clone(),
        });
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HabitStore for InMemoryStore {
    async fn fetch_habits(&self, user_id: &UserId) -> Result<Vec<Habit>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .habits
            .iter()
            .filter(|h| &h.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn fetch_completions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CompletionEvent>, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .completions
            .iter()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StoreError> {
        self.check_available()?;
        let state = self.state.read().await;
        state
            .habits
            .iter()
            .find(|h| &h.id == habit_id)
            .cloned()
            .ok_or_else(|| StoreError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })
    }

    async fn create_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.habits.push(habit.clone());
        drop(state);
        self.notify(ResourceKind::Habits, Mutation::Created, &habit.user_id);
        Ok(())
    }

    async fn update_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slot = state
            .habits
            .iter_mut()
            .find(|h| h.id == habit.id)
            .ok_or_else(|| StoreError::HabitNotFound {
                habit_id: habit.id.to_string(),
            })?;
        *slot = habit.clone();
        drop(state);
        self.notify(ResourceKind::Habits, Mutation::Updated, &habit.user_id);
        Ok(())
    }

    async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let position = state
            .habits
            .iter()
            .position(|h| &h.id == habit_id)
            .ok_or_else(|| StoreError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })?;
        // the completion log is append-only; orphaned events stay behind
        let removed = state.habits.remove(position);
        drop(state);
        self.notify(ResourceKind::Habits, Mutation::Deleted, &removed.user_id);
        Ok(())
    }

    async fn append_completion(&self, event: &CompletionEvent) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.completions.push(event.clone());
        drop(state);
        self.notify(ResourceKind::Completions, Mutation::Created, &event.user_id);
        Ok(())
    }

    fn subscribe(
        &self,
        resource: ResourceKind,
        user_id: &UserId,
    ) -> BoxStream<'static, MutationEvent> {
        let rx = match resource {
            ResourceKind::Habits => self.habit_tx.subscribe(),
            ResourceKind::Completions => self.completion_tx.subscribe(),
        };
        let user_id = user_id.clone();
        Box::pin(futures::stream::unfold(rx, move |mut rx| {
            let user_id = user_id.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(event) if event.user_id == user_id => return Some((event, rx)),
                        // another user's mutation
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "mutation subscriber lagged, continuing");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        }))
    }
}
