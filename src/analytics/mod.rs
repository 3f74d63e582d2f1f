//! Read-only analytics over the habit ledger.
//!
//! The submodules are pure functions over plain slices; `Analytics` loads a
//! snapshot from SQLite and feeds it to them. Missing habits and empty
//! histories produce zero or empty results, never errors.

pub mod calendar;
pub mod rate;
pub mod streak;
pub mod struggle;
pub mod weekday;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::Connection;

use crate::db::repository::{CompletionRepo, HabitRepo, PreferencesRepo};
use crate::error::Result;
use crate::models::{
    DayProfile, Habit, HabitRate, HabitSummary, Periodicity, RateWindow, Streak,
};

use calendar::period_start_date;
use rate::{
    age_bounded_rate, analysis_window, fixed_window_rate, fixed_window_start, lifetime_rate,
};
use streak::compute_streaks;
use struggle::rank_struggling;
use weekday::profile_weekdays;

pub struct Analytics;

impl Analytics {
    pub fn streaks(conn: &Connection, habit_id: i64, today: DateTime<Utc>) -> Result<Streak> {
        let Some(habit) = HabitRepo::get(conn, habit_id)? else {
            return Ok(Streak::default());
        };
        let instants = CompletionRepo::instants(conn, habit.id)?;
        warn_on_duplicates(&habit, &instants);

        let streak = compute_streaks(&instants, habit.periodicity, today);
        debug!(
            "Habit {} streaks: longest={} current={}",
            habit.id, streak.longest_streak, streak.current_streak
        );
        Ok(streak)
    }

    /// Rate of one habit over the given window; `None` for a missing habit.
    pub fn habit_rate(
        conn: &Connection,
        habit_id: i64,
        window: RateWindow,
        today: DateTime<Utc>,
    ) -> Result<Option<HabitRate>> {
        match HabitRepo::get(conn, habit_id)? {
            None => Ok(None),
            Some(habit) => Ok(Some(Self::rate_for(conn, &habit, window, today)?)),
        }
    }

    pub fn completion_rates(
        conn: &Connection,
        window: RateWindow,
        today: DateTime<Utc>,
    ) -> Result<Vec<HabitRate>> {
        HabitRepo::list(conn, None)?
            .iter()
            .map(|habit| Self::rate_for(conn, habit, window, today))
            .collect()
    }

    /// Worst performers under the struggle threshold. Explicit arguments
    /// override the stored preferences and are clamped the same way.
    pub fn struggling(
        conn: &Connection,
        threshold: Option<f64>,
        fraction: Option<f64>,
        today: DateTime<Utc>,
    ) -> Result<Vec<HabitRate>> {
        let prefs = PreferencesRepo::get(conn, today)?;
        let threshold = threshold.unwrap_or(prefs.struggle_threshold);
        let fraction = fraction.unwrap_or(prefs.show_bottom_percent);

        let rates = Self::completion_rates(conn, RateWindow::Adaptive, today)?;
        let ranked = rank_struggling(&rates, threshold, fraction);
        debug!(
            "{} of {} habits struggling (threshold={}, fraction={})",
            ranked.len(),
            rates.len(),
            threshold,
            fraction
        );
        Ok(ranked)
    }

    pub fn day_profile(conn: &Connection, habit_id: i64) -> Result<DayProfile> {
        let Some(habit) = HabitRepo::get(conn, habit_id)? else {
            return Ok(DayProfile::empty());
        };
        if habit.periodicity != Periodicity::Weekly {
            return Ok(DayProfile::empty());
        }
        let instants = CompletionRepo::instants(conn, habit.id)?;
        Ok(profile_weekdays(&instants, habit.periodicity))
    }

    /// One overview row per habit, optionally only one periodicity:
    /// streaks, recent rate and whether the current period is already done.
    pub fn summary(
        conn: &Connection,
        periodicity: Option<Periodicity>,
        today: DateTime<Utc>,
    ) -> Result<Vec<HabitSummary>> {
        let habits = HabitRepo::list(conn, periodicity)?;
        let mut rows = Vec::with_capacity(habits.len());
        for habit in habits {
            let instants = CompletionRepo::instants(conn, habit.id)?;
            let streak = compute_streaks(&instants, habit.periodicity, today);
            let recent = CompletionRepo::count_between(conn, habit.id, fixed_window_start(today), today)?;
            let completed_this_period =
                CompletionRepo::exists_in_period(conn, habit.id, habit.periodicity, today)?;
            rows.push(HabitSummary {
                streak,
                recent_rate: fixed_window_rate(recent, habit.periodicity),
                completed_this_period,
                total_completions: instants.len() as i64,
                habit,
            });
        }
        Ok(rows)
    }

    fn rate_for(
        conn: &Connection,
        habit: &Habit,
        window: RateWindow,
        today: DateTime<Utc>,
    ) -> Result<HabitRate> {
        let completion_rate = match window {
            RateWindow::Recent => {
                let completed =
                    CompletionRepo::count_between(conn, habit.id, fixed_window_start(today), today)?;
                fixed_window_rate(completed, habit.periodicity)
            }
            RateWindow::Adaptive => {
                let window = analysis_window(habit.created_at, today);
                let completed = CompletionRepo::count_since(conn, habit.id, window.start)?;
                age_bounded_rate(completed, habit.periodicity, window)
            }
            RateWindow::Lifetime => {
                let completed = CompletionRepo::count_all(conn, habit.id)?;
                lifetime_rate(completed, habit.periodicity, habit.created_at, today)
            }
        };

        Ok(HabitRate {
            id: habit.id,
            name: habit.name.clone(),
            completion_rate,
        })
    }
}

/// Duplicate completions in one period are counted as-is; just note them.
fn warn_on_duplicates(habit: &Habit, instants: &[DateTime<Utc>]) {
    let duplicates = instants
        .windows(2)
        .filter(|pair| {
            period_start_date(habit.periodicity, pair[0])
                == period_start_date(habit.periodicity, pair[1])
        })
        .count();
    if duplicates > 0 {
        warn!(
            "Habit {} has {} completion(s) sharing a period with another",
            habit.id, duplicates
        );
    }
}
