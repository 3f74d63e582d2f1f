use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::str::FromStr;

use crate::analytics::calendar::period_start_date;
use crate::db::repository::{CompletionRepo, HabitRepo};
use crate::error::{HabitError, Result};
use crate::models::{Completion, Habit, Periodicity};

/// Write path for habits and their completions.
pub struct HabitService;

impl HabitService {
    /// Periodicity is validated before anything is written.
    pub fn create_habit(
        conn: &Connection,
        name: &str,
        periodicity: &str,
        now: DateTime<Utc>,
    ) -> Result<Habit> {
        let periodicity = Periodicity::from_str(periodicity)?;
        let habit = HabitRepo::insert(conn, name, periodicity, now)?;
        info!("Created {} habit {} '{}'", periodicity.as_str(), habit.id, habit.name);
        Ok(habit)
    }

    pub fn get_habit(conn: &Connection, id: i64) -> Result<Habit> {
        HabitRepo::get(conn, id)?.ok_or(HabitError::NotFound(id))
    }

    pub fn rename_habit(conn: &Connection, id: i64, name: &str) -> Result<Habit> {
        if !HabitRepo::rename(conn, id, name)? {
            return Err(HabitError::NotFound(id));
        }
        info!("Renamed habit {} to '{}'", id, name);
        Self::get_habit(conn, id)
    }

    /// Returns the habit as it was before deletion.
    pub fn delete_habit(conn: &Connection, id: i64) -> Result<Habit> {
        let tx = begin_write(conn)?;
        let habit = Self::get_habit(&tx, id)?;
        if !HabitRepo::delete(&tx, id)? {
            return Err(HabitError::NotFound(id));
        }
        tx.commit()?;
        info!("Deleted habit {} '{}' and its completions", id, habit.name);
        Ok(habit)
    }

    /// Record a completion at `at`. Rejected with `AlreadyCompleted` if the
    /// period containing `at` already has one.
    pub fn check_off(conn: &Connection, id: i64, at: DateTime<Utc>) -> Result<Completion> {
        let tx = begin_write(conn)?;
        let habit = Self::get_habit(&tx, id)?;

        if CompletionRepo::exists_in_period(&tx, id, habit.periodicity, at)? {
            let period_start = period_start_date(habit.periodicity, at);
            warn!("Habit {} already completed for period starting {}", id, period_start);
            return Err(HabitError::AlreadyCompleted {
                habit_id: id,
                period_start,
            });
        }

        // The write lock is held from BEGIN, so no other writer can land
        // between the check and the insert. The unique index backs it up.
        let completion = CompletionRepo::insert(&tx, id, habit.periodicity, at)?;
        tx.commit()?;
        info!("Checked off habit {} at {}", id, completion.completed_at);
        Ok(completion)
    }

    pub fn is_completed_in_current_period(
        conn: &Connection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let habit = Self::get_habit(conn, id)?;
        CompletionRepo::exists_in_period(conn, id, habit.periodicity, now)
    }

    pub fn completions(
        conn: &Connection,
        id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Completion>> {
        Self::get_habit(conn, id)?;
        CompletionRepo::list(conn, id, since)
    }
}

/// Take the write lock up front. A deferred transaction that reads first
/// fails with SQLITE_BUSY_SNAPSHOT if another writer commits meanwhile.
fn begin_write(conn: &Connection) -> Result<Transaction<'_>> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::{Duration, TimeZone};
    use std::path::Path;
    use tempfile::TempDir;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap()
    }

    /// A WAL database on disk, opened the way main does it.
    fn file_conn(path: &Path) -> Connection {
        let conn = Connection::open(path).unwrap();
        conn.busy_timeout(std::time::Duration::from_secs(5)).unwrap();
        conn.execute_batch("PRAGMA journal_mode=WAL;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn creates_habits_with_valid_periodicity() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "Exercise", "daily", now()).unwrap();
        assert_eq!(habit.name, "Exercise");
        assert_eq!(habit.periodicity, Periodicity::Daily);
        assert_eq!(habit.created_at, now());

        let weekly = HabitService::create_habit(&conn, "Groceries", "Weekly", now()).unwrap();
        assert_eq!(weekly.periodicity, Periodicity::Weekly);
    }

    #[test]
    fn invalid_periodicity_writes_nothing() {
        let conn = conn();
        let err = HabitService::create_habit(&conn, "Invalid", "monthly", now()).unwrap_err();
        assert!(matches!(err, HabitError::InvalidPeriodicity(_)));
        assert!(HabitRepo::list(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn empty_name_is_allowed() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "", "daily", now()).unwrap();
        assert_eq!(habit.name, "");
    }

    #[test]
    fn missing_habit_is_not_found_for_writes() {
        let conn = conn();
        assert!(matches!(
            HabitService::rename_habit(&conn, 999, "x"),
            Err(HabitError::NotFound(999))
        ));
        assert!(matches!(
            HabitService::delete_habit(&conn, 999),
            Err(HabitError::NotFound(999))
        ));
        assert!(matches!(
            HabitService::check_off(&conn, 999, now()),
            Err(HabitError::NotFound(999))
        ));
        assert!(matches!(
            HabitService::is_completed_in_current_period(&conn, 999, now()),
            Err(HabitError::NotFound(999))
        ));
    }

    #[test]
    fn check_off_round_trip() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "Read", "daily", now()).unwrap();
        assert!(!HabitService::is_completed_in_current_period(&conn, habit.id, now()).unwrap());

        HabitService::check_off(&conn, habit.id, now()).unwrap();
        assert!(HabitService::is_completed_in_current_period(&conn, habit.id, now()).unwrap());

        let err = HabitService::check_off(&conn, habit.id, now() + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, HabitError::AlreadyCompleted { .. }));
        assert_eq!(CompletionRepo::count_all(&conn, habit.id).unwrap(), 1);

        // next day is a new period
        HabitService::check_off(&conn, habit.id, now() + Duration::days(1)).unwrap();
        assert_eq!(CompletionRepo::count_all(&conn, habit.id).unwrap(), 2);
    }

    #[test]
    fn weekly_check_off_is_once_per_week() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "Review", "weekly", now()).unwrap();
        // 2024-01-10 is a Wednesday; Sunday the 14th is the same week
        HabitService::check_off(&conn, habit.id, now()).unwrap();
        let sunday = Utc.with_ymd_and_hms(2024, 1, 14, 20, 0, 0).unwrap();
        assert!(matches!(
            HabitService::check_off(&conn, habit.id, sunday),
            Err(HabitError::AlreadyCompleted { .. })
        ));
        let monday = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap();
        HabitService::check_off(&conn, habit.id, monday).unwrap();
    }

    #[test]
    fn delete_returns_the_habit_and_removes_completions() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "Delete Me", "daily", now()).unwrap();
        HabitService::check_off(&conn, habit.id, now()).unwrap();

        let deleted = HabitService::delete_habit(&conn, habit.id).unwrap();
        assert_eq!(deleted.name, "Delete Me");
        assert!(HabitRepo::get(&conn, habit.id).unwrap().is_none());
        assert_eq!(CompletionRepo::count_all(&conn, habit.id).unwrap(), 0);

        assert!(matches!(
            HabitService::delete_habit(&conn, habit.id),
            Err(HabitError::NotFound(_))
        ));
    }

    #[test]
    fn concurrent_check_off_comes_back_as_already_completed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("habits.db");
        let first = file_conn(&path);
        let habit = HabitService::create_habit(&first, "Stretch", "daily", now()).unwrap();

        // First writer is mid check-off: lock taken, nothing recorded yet
        let tx = begin_write(&first).unwrap();
        assert!(!CompletionRepo::exists_in_period(&tx, habit.id, habit.periodicity, now()).unwrap());

        let second = {
            let path = path.clone();
            let id = habit.id;
            std::thread::spawn(move || {
                let conn = file_conn(&path);
                HabitService::check_off(&conn, id, now() + Duration::hours(1))
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(100));
        CompletionRepo::insert(&tx, habit.id, habit.periodicity, now()).unwrap();
        tx.commit().unwrap();

        let raced = second.join().unwrap();
        assert!(matches!(
            raced,
            Err(HabitError::AlreadyCompleted { habit_id, .. }) if habit_id == habit.id
        ));
        assert_eq!(CompletionRepo::count_all(&first, habit.id).unwrap(), 1);
    }

    #[test]
    fn other_connection_sees_committed_check_off() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("habits.db");
        let a = file_conn(&path);
        let b = file_conn(&path);
        let habit = HabitService::create_habit(&a, "Journal", "weekly", now()).unwrap();

        HabitService::check_off(&a, habit.id, now()).unwrap();
        assert!(matches!(
            HabitService::check_off(&b, habit.id, now() + Duration::days(2)),
            Err(HabitError::AlreadyCompleted { .. })
        ));
        // Skipping the pre-check still hits the unique index
        assert!(matches!(
            CompletionRepo::insert(&b, habit.id, habit.periodicity, now() + Duration::days(3)),
            Err(HabitError::AlreadyCompleted { .. })
        ));
        assert_eq!(CompletionRepo::count_all(&b, habit.id).unwrap(), 1);
    }

    #[test]
    fn rename_returns_updated_habit() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "Old", "daily", now()).unwrap();
        let renamed = HabitService::rename_habit(&conn, habit.id, "New").unwrap();
        assert_eq!(renamed.name, "New");
        assert_eq!(renamed.id, habit.id);
    }

    #[test]
    fn history_filters_by_since() {
        let conn = conn();
        let habit = HabitService::create_habit(&conn, "Walk", "daily", now()).unwrap();
        for d in 0..4 {
            HabitService::check_off(&conn, habit.id, now() + Duration::days(d)).unwrap();
        }
        let all = HabitService::completions(&conn, habit.id, None).unwrap();
        assert_eq!(all.len(), 4);
        let recent = HabitService::completions(&conn, habit.id, Some(now() + Duration::days(2))).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(matches!(
            HabitService::completions(&conn, 999, None),
            Err(HabitError::NotFound(999))
        ));
    }
}
