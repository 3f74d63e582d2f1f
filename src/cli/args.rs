use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cadence", version, author, about = "Track daily and weekly habits, streaks and completion rates")]
pub struct Cli {
    /// Use this database file instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Periodicity: daily or weekly
        #[arg(long, short, default_value = "daily")]
        periodicity: String,
    },
    /// List habits with streaks and 30-day completion
    List {
        /// Only show daily or weekly habits
        #[arg(long, short)]
        periodicity: Option<String>,
    },
    /// Show one habit in detail
    Show {
        id: i64,
    },
    /// Rename a habit
    Rename {
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a habit and all of its completions
    Delete {
        id: i64,
    },
    /// Check off a habit for the current period
    Check {
        id: i64,
        /// Record the completion at this time instead of now (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },
    /// Show whether a habit is done for the current period
    Status {
        id: i64,
    },
    /// List a habit's completions
    History {
        id: i64,
        /// Only completions at or after this date
        #[arg(long)]
        since: Option<String>,
    },
    /// Longest and current streak for a habit
    Streaks {
        id: i64,
    },
    /// Completion rates for every habit
    Rates {
        /// Window: recent (30 days), adaptive (up to 30 days by age), lifetime
        #[arg(long, short, default_value = "recent")]
        window: String,
    },
    /// Habits falling below the struggle threshold
    Struggling {
        /// Rate below which a habit counts as struggling (0.1 - 1.0)
        #[arg(long)]
        threshold: Option<f64>,
        /// Fraction of struggling habits to show (0.1 - 1.0)
        #[arg(long)]
        fraction: Option<f64>,
    },
    /// Best and worst weekday for a weekly habit
    Days {
        id: i64,
    },
    /// Show or update analytics preferences
    Prefs {
        /// Struggle threshold (clamped to 0.1 - 1.0)
        #[arg(long)]
        threshold: Option<f64>,
        /// Bottom fraction shown in the struggle list (clamped to 0.1 - 1.0)
        #[arg(long)]
        fraction: Option<f64>,
    },
    /// Fill the database with demo habits and history
    Seed {
        /// Weeks of history to generate
        #[arg(long, default_value = "4")]
        weeks: u32,
        /// Delete existing habits first
        #[arg(long)]
        reset: bool,
    },
    /// Export habits, completions and analytics as JSON to stdout
    Export,
    /// Show the config file location and active settings
    Config {
        /// Write a config file with default values if none exists
        #[arg(long)]
        init: bool,
    },
}
