use anyhow::Result;
use rusqlite::Connection;

use crate::db::repository::MetaRepo;

pub const SCHEMA_VERSION: &str = "1";

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS habits (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            periodicity  TEXT NOT NULL CHECK(periodicity IN ('daily','weekly')),
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS completions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id      INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            completed_at  TEXT NOT NULL,
            period_start  TEXT NOT NULL,
            UNIQUE(habit_id, period_start)
        );

        CREATE INDEX IF NOT EXISTS idx_completions_habit_time
            ON completions(habit_id, completed_at);

        CREATE TABLE IF NOT EXISTS preferences (
            id                   INTEGER PRIMARY KEY CHECK(id = 1),
            struggle_threshold   REAL NOT NULL DEFAULT 0.75,
            show_bottom_percent  REAL NOT NULL DEFAULT 0.25,
            updated_at           TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;

    if MetaRepo::get(conn, "schema_version")?.is_none() {
        log::info!("Initialized schema version {}", SCHEMA_VERSION);
    }
    MetaRepo::set(conn, "schema_version", SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(
            MetaRepo::get(&conn, "schema_version").unwrap().as_deref(),
            Some(SCHEMA_VERSION)
        );
    }

    #[test]
    fn enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let on: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(on, 1);
    }
}
