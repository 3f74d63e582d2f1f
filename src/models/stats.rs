use chrono::Weekday;
use serde::{Serialize, Serializer};
use std::str::FromStr;

use crate::models::Habit;

/// Weekdays in the order tallies and tie-breaks use.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub longest_streak: u32,
    pub current_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitRate {
    pub id: i64,
    pub name: String,
    pub completion_rate: f64,
}

/// Which window a completion rate is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateWindow {
    /// Fixed 30 days ending now, no pro-rating for young habits
    Recent,
    /// Up to 30 days, shortened to the habit's age
    Adaptive,
    /// Everything since the habit was created
    Lifetime,
}

impl RateWindow {
    pub fn label(&self) -> &'static str {
        match self {
            RateWindow::Recent => "last 30 days",
            RateWindow::Adaptive => "last 30 days or since creation",
            RateWindow::Lifetime => "since creation",
        }
    }
}

impl FromStr for RateWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recent" | "30d" => Ok(RateWindow::Recent),
            "adaptive" | "age" => Ok(RateWindow::Adaptive),
            "lifetime" | "all" => Ok(RateWindow::Lifetime),
            _ => Err(anyhow::anyhow!(
                "Unknown rate window '{}'. Use: recent, adaptive, lifetime",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorstDay {
    Day(Weekday),
    /// Fewer than two observed weekdays, or the minimum is shared
    NotApplicable,
}

impl std::fmt::Display for WorstDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorstDay::Day(day) => write!(f, "{}", weekday_name(*day)),
            WorstDay::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl Serialize for WorstDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn serialize_best_day<S: Serializer>(day: &Option<Weekday>, serializer: S) -> Result<S::Ok, S::Error> {
    match day {
        Some(day) => serializer.serialize_some(weekday_name(*day)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayProfile {
    #[serde(serialize_with = "serialize_best_day")]
    pub best_day: Option<Weekday>,
    pub worst_day: Option<WorstDay>,
    /// Completion counts, Monday first
    pub tallies: [u32; 7],
}

impl DayProfile {
    pub fn empty() -> Self {
        Self {
            best_day: None,
            worst_day: None,
            tallies: [0; 7],
        }
    }
}

/// One row of the overview listing.
#[derive(Debug, Clone, Serialize)]
pub struct HabitSummary {
    pub habit: Habit,
    pub streak: Streak,
    pub recent_rate: f64,
    pub completed_this_period: bool,
    pub total_completions: i64,
}
