//! Domain module containing core business logic and data types.
//!
//! Defines the core entities (Habit, CompletionEvent, StreakResult) and
//! their validation rules, plus the pure streak calculator.

pub mod completion;
pub mod habit;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use completion::*;
pub use habit::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("invalid habit title: {0}")]
    InvalidTitle(String),

    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("malformed completion timestamp: {0}")]
    MalformedTimestamp(String),
}
