use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::str::FromStr;

use crate::analytics::calendar::{period_bounds, period_start_date};
use crate::error::{HabitError, Result};
use crate::models::{clamp_preference, Completion, Habit, Periodicity, Preferences};
use crate::utils::time::{date_from_db, date_to_db, from_db, to_db};

fn corrupt(table: &'static str, detail: impl std::fmt::Display) -> HabitError {
    HabitError::CorruptRow {
        table,
        detail: detail.to_string(),
    }
}

// ─── Habit repo ──────────────────────────────────────────────────────────────

type HabitRow = (i64, String, String, String);

fn habit_from_row((id, name, periodicity, created_at): HabitRow) -> Result<Habit> {
    Ok(Habit {
        id,
        name,
        periodicity: Periodicity::from_str(&periodicity)
            .map_err(|e| corrupt("habits", format!("id {}: {}", id, e)))?,
        created_at: from_db(&created_at)
            .map_err(|e| corrupt("habits", format!("id {}: bad created_at '{}': {}", id, created_at, e)))?,
    })
}

fn read_habit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

pub struct HabitRepo;

impl HabitRepo {
    pub fn list(conn: &Connection, periodicity: Option<Periodicity>) -> Result<Vec<Habit>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, periodicity, created_at
             FROM habits WHERE (?1 IS NULL OR periodicity = ?1)
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![periodicity.map(|p| p.as_str())], read_habit_row)?;

        let mut result = Vec::new();
        for r in rows {
            result.push(habit_from_row(r?)?);
        }
        Ok(result)
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Habit>> {
        let row = conn
            .query_row(
                "SELECT id, name, periodicity, created_at FROM habits WHERE id = ?1",
                params![id],
                read_habit_row,
            )
            .optional()?;

        row.map(habit_from_row).transpose()
    }

    pub fn insert(
        conn: &Connection,
        name: &str,
        periodicity: Periodicity,
        created_at: DateTime<Utc>,
    ) -> Result<Habit> {
        conn.execute(
            "INSERT INTO habits (name, periodicity, created_at) VALUES (?1, ?2, ?3)",
            params![name, periodicity.as_str(), to_db(created_at)],
        )?;
        Ok(Habit {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            periodicity,
            created_at,
        })
    }

    pub fn rename(conn: &Connection, id: i64, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE habits SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a habit and every completion it owns. Callers wrap this in
    /// their own transaction.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        conn.execute("DELETE FROM completions WHERE habit_id = ?1", params![id])?;
        let changed = conn.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_all(conn: &Connection) -> Result<()> {
        conn.execute_batch("DELETE FROM completions; DELETE FROM habits;")?;
        Ok(())
    }
}

// ─── Completion repo ─────────────────────────────────────────────────────────

pub struct CompletionRepo;

impl CompletionRepo {
    /// Completions for one habit, ascending by instant then id.
    pub fn list(
        conn: &Connection,
        habit_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Completion>> {
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, completed_at, period_start
             FROM completions
             WHERE habit_id = ?1 AND (?2 IS NULL OR completed_at >= ?2)
             ORDER BY completed_at, id",
        )?;

        let rows = stmt.query_map(params![habit_id, since.map(to_db)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (id, habit_id, completed_at, period_start) = r?;
            result.push(Completion {
                id,
                habit_id,
                completed_at: from_db(&completed_at)
                    .map_err(|e| corrupt("completions", format!("id {}: {}", id, e)))?,
                period_start: date_from_db(&period_start)
                    .map_err(|e| corrupt("completions", format!("id {}: {}", id, e)))?,
            });
        }
        Ok(result)
    }

    /// Just the instants, ascending.
    pub fn instants(conn: &Connection, habit_id: i64) -> Result<Vec<DateTime<Utc>>> {
        Ok(Self::list(conn, habit_id, None)?
            .into_iter()
            .map(|c| c.completed_at)
            .collect())
    }

    pub fn count_all(conn: &Connection, habit_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM completions WHERE habit_id = ?1",
            params![habit_id],
            |row| row.get(0),
        )
        .map_err(HabitError::from)
    }

    pub fn count_since(conn: &Connection, habit_id: i64, since: DateTime<Utc>) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM completions WHERE habit_id = ?1 AND completed_at >= ?2",
            params![habit_id, to_db(since)],
            |row| row.get(0),
        )
        .map_err(HabitError::from)
    }

    /// Count within the inclusive range `[start, end]`.
    pub fn count_between(
        conn: &Connection,
        habit_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM completions
             WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at <= ?3",
            params![habit_id, to_db(start), to_db(end)],
            |row| row.get(0),
        )
        .map_err(HabitError::from)
    }

    pub fn exists_in_period(
        conn: &Connection,
        habit_id: i64,
        periodicity: Periodicity,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let (start, end) = period_bounds(periodicity, at);
        let found: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM completions
                           WHERE habit_id = ?1 AND completed_at >= ?2 AND completed_at <= ?3)",
            params![habit_id, to_db(start), to_db(end)],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Append a completion. A second completion in the same period hits the
    /// `UNIQUE(habit_id, period_start)` index and comes back as
    /// `AlreadyCompleted`.
    pub fn insert(
        conn: &Connection,
        habit_id: i64,
        periodicity: Periodicity,
        at: DateTime<Utc>,
    ) -> Result<Completion> {
        let period_start = period_start_date(periodicity, at);
        let inserted = conn.execute(
            "INSERT INTO completions (habit_id, completed_at, period_start) VALUES (?1, ?2, ?3)",
            params![habit_id, to_db(at), date_to_db(period_start)],
        );

        match inserted {
            Ok(_) => Ok(Completion {
                id: conn.last_insert_rowid(),
                habit_id,
                completed_at: at,
                period_start,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(HabitError::AlreadyCompleted {
                    habit_id,
                    period_start,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ─── Preferences repo ────────────────────────────────────────────────────────

pub struct PreferencesRepo;

impl PreferencesRepo {
    /// The single preferences row, created with defaults on first read.
    pub fn get(conn: &Connection, now: DateTime<Utc>) -> Result<Preferences> {
        let defaults = Preferences::defaults(now);
        conn.execute(
            "INSERT OR IGNORE INTO preferences (id, struggle_threshold, show_bottom_percent, updated_at)
             VALUES (1, ?1, ?2, ?3)",
            params![
                defaults.struggle_threshold,
                defaults.show_bottom_percent,
                to_db(defaults.updated_at)
            ],
        )?;

        let (threshold, fraction, updated_at) = conn.query_row(
            "SELECT struggle_threshold, show_bottom_percent, updated_at FROM preferences WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?;

        Ok(Preferences {
            struggle_threshold: threshold,
            show_bottom_percent: fraction,
            updated_at: from_db(&updated_at).map_err(|e| corrupt("preferences", e))?,
        })
    }

    /// Update either value; both are clamped into [0.1, 1.0] before saving.
    pub fn update(
        conn: &Connection,
        struggle_threshold: Option<f64>,
        show_bottom_percent: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Preferences> {
        let current = Self::get(conn, now)?;
        let updated = Preferences {
            struggle_threshold: clamp_preference(
                struggle_threshold.unwrap_or(current.struggle_threshold),
            ),
            show_bottom_percent: clamp_preference(
                show_bottom_percent.unwrap_or(current.show_bottom_percent),
            ),
            updated_at: now,
        };

        conn.execute(
            "UPDATE preferences
             SET struggle_threshold = ?1, show_bottom_percent = ?2, updated_at = ?3
             WHERE id = 1",
            params![
                updated.struggle_threshold,
                updated.show_bottom_percent,
                to_db(updated.updated_at)
            ],
        )?;
        Ok(updated)
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(HabitError::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}
