//! External store interface.
//!
//! The engine owns no storage: habits and the completion log live in an
//! external system reached through the [`HabitStore`] trait. The trait
//! exposes per-user snapshot reads, the mutation entry points that feed the
//! log, and per-resource mutation subscriptions consumed by the change
//! reactor.

pub mod memory;

// Re-export the bundled store implementation
pub use memory::InMemoryStore;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CompletionEvent, Habit, HabitId, UserId};

/// Errors surfaced by the external store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure (network, timeout, serialization)
    #[error("store transport error: {0}")]
    Transport(String),

    /// Authentication or authorization failure
    #[error("store authorization error: {0}")]
    Unauthorized(String),

    #[error("habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },
}

/// Which resource a mutation notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Habits,
    Completions,
}

/// The kind of mutation that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    Created,
    Updated,
    Deleted,
}

/// An opaque change signal.
///
/// The engine re-fetches and recomputes on any event for a resource; it
/// never inspects the payload beyond the resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub resource: ResourceKind,
    pub mutation: Mutation,
    pub user_id: UserId,
}

/// Read and mutation interface of the external habit store.
///
/// Mirrors what a remote backend offers: per-user snapshot fetches, CRUD on
/// habits, append-only completion writes, and a stream of change signals
/// per resource. Implementations must emit a [`MutationEvent`] for every
/// mutation they apply, and are responsible for their own retry policy.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Fetch the user's habits as of now
    async fn fetch_habits(&self, user_id: &UserId) -> Result<Vec<Habit>, StoreError>;

    /// Fetch the user's full completion log as of now
    async fn fetch_completions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CompletionEvent>, StoreError>;

    /// Fetch a single habit
    async fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StoreError>;

    /// Create a new habit
    async fn create_habit(&self, habit: &Habit) -> Result<(), StoreError>;

    /// Replace an existing habit
    async fn update_habit(&self, habit: &Habit) -> Result<(), StoreError>;

    /// Delete a habit
    async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StoreError>;

    /// Append a completion event to the log
    async fn append_completion(&self, event: &CompletionEvent) -> Result<(), StoreError>;

    /// Subscribe to mutation signals for one resource kind, scoped to a user
    fn subscribe(
        &self,
        resource: ResourceKind,
        user_id: &UserId,
    ) -> BoxStream<'static, MutationEvent>;
}
