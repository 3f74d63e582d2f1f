use chrono::NaiveDate;
use thiserror::Error;

/// Outcomes of the habit write path that callers are expected to branch on.
#[derive(Debug, Error)]
pub enum HabitError {
    #[error("Habit {0} not found")]
    NotFound(i64),

    #[error("Unknown periodicity '{0}'. Use: daily, weekly")]
    InvalidPeriodicity(String),

    #[error("Habit {habit_id} is already completed for the period starting {period_start}")]
    AlreadyCompleted {
        habit_id: i64,
        period_start: NaiveDate,
    },

    #[error("Corrupt {table} row: {detail}")]
    CorruptRow { table: &'static str, detail: String },

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, HabitError>;
