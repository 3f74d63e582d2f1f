use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::HabitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Daily,
    Weekly,
}

impl Periodicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Periodicity::Daily => "Daily",
            Periodicity::Weekly => "Weekly",
        }
    }

    /// Noun for the period a single completion covers.
    pub fn period_noun(&self) -> &'static str {
        match self {
            Periodicity::Daily => "today",
            Periodicity::Weekly => "this week",
        }
    }
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Periodicity {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            _ => Err(HabitError::InvalidPeriodicity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    pub periodicity: Periodicity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: i64,
    pub habit_id: i64,
    pub completed_at: DateTime<Utc>,
    /// First day of the period this completion counts toward
    pub period_start: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_periodicities_case_insensitively() {
        assert_eq!("daily".parse::<Periodicity>().unwrap(), Periodicity::Daily);
        assert_eq!("WEEKLY".parse::<Periodicity>().unwrap(), Periodicity::Weekly);
        assert_eq!(" Weekly ".parse::<Periodicity>().unwrap(), Periodicity::Weekly);
    }

    #[test]
    fn rejects_unknown_periodicity() {
        let err = "monthly".parse::<Periodicity>().unwrap_err();
        assert!(matches!(err, HabitError::InvalidPeriodicity(ref s) if s == "monthly"));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Periodicity::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
    }
}
