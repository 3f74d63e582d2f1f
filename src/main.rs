mod analytics;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::time::Duration;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;

    // Resolve and open the DB
    let db_path = config.db_path(cli.db.as_deref())?;
    AppConfig::ensure_parent_dir(&db_path)?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;
    log::debug!("Using database {:?}", db_path);

    // Enable WAL mode for better concurrent access
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    // Writers queue for the lock instead of failing with SQLITE_BUSY
    conn.busy_timeout(Duration::from_secs(5))?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    match cli.command {
        Some(Commands::Add { name, periodicity }) => {
            handlers::handle_add(&conn, &config, &name, &periodicity)?;
        }
        Some(Commands::List { periodicity }) => {
            handlers::handle_list(&conn, &config, periodicity.as_deref())?;
        }
        Some(Commands::Show { id }) => {
            handlers::handle_show(&conn, &config, id)?;
        }
        Some(Commands::Rename { id, name }) => {
            handlers::handle_rename(&conn, &config, id, &name)?;
        }
        Some(Commands::Delete { id }) => {
            handlers::handle_delete(&conn, &config, id)?;
        }
        Some(Commands::Check { id, at }) => {
            handlers::handle_check(&conn, &config, id, at.as_deref())?;
        }
        Some(Commands::Status { id }) => {
            handlers::handle_status(&conn, &config, id)?;
        }
        Some(Commands::History { id, since }) => {
            handlers::handle_history(&conn, &config, id, since.as_deref())?;
        }
        Some(Commands::Streaks { id }) => {
            handlers::handle_streaks(&conn, &config, id)?;
        }
        Some(Commands::Rates { window }) => {
            handlers::handle_rates(&conn, &config, &window)?;
        }
        Some(Commands::Struggling { threshold, fraction }) => {
            handlers::handle_struggling(&conn, &config, threshold, fraction)?;
        }
        Some(Commands::Days { id }) => {
            handlers::handle_days(&conn, &config, id)?;
        }
        Some(Commands::Prefs { threshold, fraction }) => {
            handlers::handle_prefs(&conn, &config, threshold, fraction)?;
        }
        Some(Commands::Seed { weeks, reset }) => {
            handlers::handle_seed(&conn, &config, weeks, reset)?;
        }
        Some(Commands::Export) => {
            handlers::handle_export(&conn)?;
        }
        Some(Commands::Config { init }) => {
            handlers::handle_config(&config, &db_path, init)?;
        }

        // No subcommand → overview
        None => {
            handlers::handle_list(&conn, &config, None)?;
        }
    }

    Ok(())
}
