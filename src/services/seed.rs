use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use log::info;
use rusqlite::Connection;

use crate::analytics::calendar::period_length_days;
use crate::db::repository::{CompletionRepo, HabitRepo};
use crate::error::Result;
use crate::models::{Habit, Periodicity};
use crate::utils::time::start_of_day;

const DEMO_HABITS: [(&str, Periodicity); 5] = [
    ("Drink 8 glasses of water", Periodicity::Daily),
    ("Exercise for 30 minutes", Periodicity::Daily),
    ("Read a book for 15 minutes", Periodicity::Daily),
    ("Go for a walk", Periodicity::Daily),
    ("Weekly review of goals", Periodicity::Weekly),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub habits: usize,
    pub completions: usize,
}

/// Populate the ledger with demo habits and `weeks` of history ending today.
///
/// The pattern is deterministic: daily habit `n` skips every day whose
/// index is congruent to `n` mod 4 (about three days in four), and the
/// weekly habit is done on Wednesdays except every third week.
pub fn seed_demo_data(conn: &Connection, weeks: u32, now: DateTime<Utc>) -> Result<SeedReport> {
    let total_days = i64::from(weeks) * period_length_days(Periodicity::Weekly);
    let today = now.date_naive();
    let created_at = start_of_day(today - Duration::days(total_days));

    let tx = conn.unchecked_transaction()?;
    let mut habits: Vec<Habit> = Vec::with_capacity(DEMO_HABITS.len());
    for (name, periodicity) in DEMO_HABITS {
        habits.push(HabitRepo::insert(&tx, name, periodicity, created_at)?);
    }

    let mut completions = 0usize;
    for (n, habit) in habits.iter().enumerate() {
        for i in 0..total_days {
            let date = today - Duration::days(i);
            let done = match habit.periodicity {
                Periodicity::Daily => i % 4 != n as i64 % 4,
                Periodicity::Weekly => date.weekday() == Weekday::Wed && (i / 7) % 3 != 2,
            };
            if !done {
                continue;
            }
            let at = start_of_day(date) + Duration::hours(7 + n as i64);
            if at > now {
                continue;
            }
            CompletionRepo::insert(&tx, habit.id, habit.periodicity, at)?;
            completions += 1;
        }
    }
    tx.commit()?;

    info!("Seeded {} habits with {} completions", habits.len(), completions);
    Ok(SeedReport {
        habits: habits.len(),
        completions,
    })
}
