pub mod habit;
pub mod preferences;
pub mod stats;

pub use habit::{Completion, Habit, Periodicity};
pub use preferences::{clamp_preference, Preferences};
pub use stats::{
    weekday_name, DayProfile, HabitRate, HabitSummary, RateWindow, Streak, WorstDay, WEEK,
};
