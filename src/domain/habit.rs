//! Habit entity and related functionality.
//!
//! Defines the `Habit` struct that represents a recurring task a user
//! tracks, along with its validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Frequency, HabitId, UserId};

/// A habit represents something the user wants to do regularly.
///
/// The engine treats a habit as an immutable snapshot per aggregation pass;
/// creation, update and deletion happen through the external store.
/// `streak_count` and `last_completed` are cached display fields written by
/// the completion-submission path; the completion log, not these fields, is
/// the source of truth for streak math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Owner of this habit
    pub user_id: UserId,
    /// Display title (e.g., "Morning Run")
    pub title: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Target frequency, informational only
    pub frequency: Frequency,
    /// Cached streak counter maintained by the submission path
    pub streak_count: u32,
    /// Cached timestamp of the most recent credited completion
    pub last_completed: Option<DateTime<Utc>>,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new habit with validation.
    ///
    /// This is the main constructor that validates all fields and returns
    /// an error if any validation fails.
    pub fn new(
        user_id: UserId,
        title: String,
        description: Option<String>,
        frequency: Frequency,
    ) -> Result<Self, DomainError> {
        Self::validate_title(&title)?;
        Self::validate_description(&description)?;

        Ok(Self {
            id: HabitId::new(),
            user_id,
            title,
            description,
            frequency,
            streak_count: 0,
            last_completed: None,
            created_at: Utc::now(),
        })
    }

    /// Create a habit from existing data (store loading path).
    ///
    /// Assumes the data is already validated.
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: HabitId,
        user_id: UserId,
        title: String,
        description: Option<String>,
        frequency: Frequency,
        streak_count: u32,
        last_completed: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            title,
            description,
            frequency,
            streak_count,
            last_completed,
            created_at,
        }
    }

    /// Refresh the cached display fields after a credited completion.
    ///
    /// The engine never reads these fields back; every aggregation pass
    /// recomputes streaks from the log.
    pub fn note_completion(&mut self, at: DateTime<Utc>) {
        self.streak_count += 1;
        self.last_completed = Some(at);
    }

    // Validation helper methods

    fn validate_title(title: &str) -> Result<(), DomainError> {
        let trimmed = title.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidTitle(
                "Habit title cannot be empty".to_string(),
            ));
        }

        if trimmed.len() > 100 {
            return Err(DomainError::InvalidTitle(
                "Habit title cannot be longer than 100 characters".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.len() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string(),
                });
            }
        }
        Ok(())
    }
}
