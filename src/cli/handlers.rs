use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::str::FromStr;

use crate::analytics::Analytics;
use crate::config::AppConfig;
use crate::db::repository::{CompletionRepo, HabitRepo, PreferencesRepo};
use crate::error::HabitError;
use crate::models::{
    weekday_name, Completion, DayProfile, Habit, Periodicity, Preferences, RateWindow, Streak,
    WEEK,
};
use crate::services::{seed_demo_data, HabitService};
use crate::utils::format::{format_instant, format_percent, plural, rate_bar};
use crate::utils::time::parse_instant_arg;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($pal:expr, $color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("{}", $pal.reset);
    }};
}

/// Escape codes, or empty strings when colour is off.
pub struct Palette {
    pub green: &'static str,
    pub amber: &'static str,
    pub red: &'static str,
    pub dim: &'static str,
    pub bold: &'static str,
    pub accent: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                green: "\x1b[32m",
                amber: "\x1b[33m",
                red: "\x1b[31m",
                dim: "\x1b[2m",
                bold: "\x1b[1m",
                accent: "\x1b[38;2;196;160;68m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                green: "",
                amber: "",
                red: "",
                dim: "",
                bold: "",
                accent: "",
                reset: "",
            }
        }
    }

    fn for_rate(&self, rate: f64) -> &'static str {
        if rate >= 0.75 {
            self.green
        } else if rate >= 0.4 {
            self.amber
        } else {
            self.red
        }
    }
}

fn periodicity_arg(s: &str) -> Result<Periodicity> {
    Periodicity::from_str(s).map_err(anyhow::Error::from)
}

fn unit_for(periodicity: Periodicity) -> &'static str {
    match periodicity {
        Periodicity::Daily => "day",
        Periodicity::Weekly => "week",
    }
}

// ─── Habits ──────────────────────────────────────────────────────────────────

pub fn handle_add(conn: &Connection, config: &AppConfig, name: &str, periodicity: &str) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let habit = HabitService::create_habit(conn, name, periodicity, Utc::now())?;
    println_colored!(
        pal,
        pal.green,
        "  ✓ Added {} habit #{}: {}",
        habit.periodicity.as_str(),
        habit.id,
        habit.name
    );
    Ok(())
}

pub fn handle_list(conn: &Connection, config: &AppConfig, periodicity: Option<&str>) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let filter = periodicity.map(periodicity_arg).transpose()?;
    let now = Utc::now();

    let rows = Analytics::summary(conn, filter, now)?;

    println!();
    if rows.is_empty() {
        println_colored!(pal, pal.dim, "  No habits yet. Add one with: cadence add <name>");
        println!();
        return Ok(());
    }

    println_colored!(pal, pal.accent, "  Habits");
    println!();
    for row in &rows {
        let mark = if row.completed_this_period {
            format!("{}✓{}", pal.green, pal.reset)
        } else {
            format!("{}○{}", pal.dim, pal.reset)
        };
        println!(
            "  {} {:>3}  {:<28}  {:<6}  {}{}{}  {:>4}  streak {}",
            mark,
            row.habit.id,
            row.habit.name,
            row.habit.periodicity.as_str(),
            pal.for_rate(row.recent_rate),
            rate_bar(row.recent_rate, config.display.bar_width),
            pal.reset,
            format_percent(row.recent_rate),
            row.streak.current_streak
        );
    }
    println!();
    println_colored!(pal, pal.dim, "  ✓ done this period  ·  bar = last 30 days");
    println!();
    Ok(())
}

pub fn handle_show(conn: &Connection, config: &AppConfig, id: i64) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let now = Utc::now();
    let habit = HabitService::get_habit(conn, id)?;
    let streak = Analytics::streaks(conn, id, now)?;
    let done = HabitService::is_completed_in_current_period(conn, id, now)?;
    let total = CompletionRepo::count_all(conn, id)?;

    println!();
    println_colored!(pal, pal.accent, "  #{} {}", habit.id, habit.name);
    println!();
    println!("  Periodicity:  {}", habit.periodicity);
    println!(
        "  Created:      {} UTC",
        format_instant(habit.created_at, &config.display.date_format)
    );
    println!("  Completions:  {}", total);
    print_streak(&pal, &streak, habit.periodicity);

    for window in [RateWindow::Recent, RateWindow::Adaptive, RateWindow::Lifetime] {
        if let Some(rate) = Analytics::habit_rate(conn, id, window, now)? {
            println!(
                "  Rate:         {}{:>4}{}  {}",
                pal.for_rate(rate.completion_rate),
                format_percent(rate.completion_rate),
                pal.reset,
                window.label()
            );
        }
    }

    if done {
        println_colored!(pal, pal.green, "  ✓ Done {}", habit.periodicity.period_noun());
    } else {
        println_colored!(pal, pal.amber, "  ○ Not done {}", habit.periodicity.period_noun());
    }

    if habit.periodicity == Periodicity::Weekly {
        let profile = Analytics::day_profile(conn, id)?;
        print_day_profile(&pal, &profile);
    }
    println!();
    Ok(())
}

pub fn handle_rename(conn: &Connection, config: &AppConfig, id: i64, name: &str) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let habit = HabitService::rename_habit(conn, id, name)?;
    println_colored!(pal, pal.green, "  ✓ Habit #{} is now: {}", habit.id, habit.name);
    Ok(())
}

pub fn handle_delete(conn: &Connection, config: &AppConfig, id: i64) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let habit = HabitService::delete_habit(conn, id)?;
    println_colored!(pal, pal.red, "  ✗ Deleted #{} {} and its history", habit.id, habit.name);
    Ok(())
}

// ─── Completions ─────────────────────────────────────────────────────────────

pub fn handle_check(conn: &Connection, config: &AppConfig, id: i64, at: Option<&str>) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let at = match at {
        Some(s) => parse_instant_arg(s)?,
        None => Utc::now(),
    };

    match HabitService::check_off(conn, id, at) {
        Ok(completion) => {
            let habit = HabitService::get_habit(conn, id)?;
            let streak = Analytics::streaks(conn, id, Utc::now().max(at))?;
            println_colored!(
                pal,
                pal.green,
                "  ✓ {} checked off ({})  ·  streak {}",
                habit.name,
                format_instant(completion.completed_at, &config.display.date_format),
                plural(streak.current_streak, unit_for(habit.periodicity))
            );
            Ok(())
        }
        Err(HabitError::AlreadyCompleted { period_start, .. }) => {
            println_colored!(
                pal,
                pal.amber,
                "  ○ Already checked off for the period starting {}",
                period_start
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn handle_status(conn: &Connection, config: &AppConfig, id: i64) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let habit = HabitService::get_habit(conn, id)?;
    if HabitService::is_completed_in_current_period(conn, id, Utc::now())? {
        println_colored!(pal, pal.green, "  ✓ {} is done {}", habit.name, habit.periodicity.period_noun());
    } else {
        println_colored!(pal, pal.amber, "  ○ {} is not done {}", habit.name, habit.periodicity.period_noun());
    }
    Ok(())
}

pub fn handle_history(conn: &Connection, config: &AppConfig, id: i64, since: Option<&str>) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let since = since.map(parse_instant_arg).transpose()?;
    let habit = HabitService::get_habit(conn, id)?;
    let completions = HabitService::completions(conn, id, since)?;

    println!();
    println_colored!(pal, pal.accent, "  History: {}", habit.name);
    println!();
    if completions.is_empty() {
        println_colored!(pal, pal.dim, "  No completions recorded");
    }
    for c in &completions {
        println!(
            "  {}  {}(period from {}){}",
            format_instant(c.completed_at, &config.display.date_format),
            pal.dim,
            c.period_start,
            pal.reset
        );
    }
    println!();
    Ok(())
}

// ─── Analytics ───────────────────────────────────────────────────────────────

fn print_streak(pal: &Palette, streak: &Streak, periodicity: Periodicity) {
    let unit = unit_for(periodicity);
    println_colored!(
        pal,
        pal.bold,
        "  Streak:       {} current  |  {} longest",
        plural(streak.current_streak, unit),
        plural(streak.longest_streak, unit)
    );
}

fn print_day_profile(pal: &Palette, profile: &DayProfile) {
    match (profile.best_day, profile.worst_day) {
        (Some(best), Some(worst)) => {
            println_colored!(pal, pal.green, "  Best day:     {}", weekday_name(best));
            println_colored!(pal, pal.amber, "  Worst day:    {}", worst);
            let row: Vec<String> = WEEK
                .iter()
                .zip(profile.tallies.iter())
                .map(|(day, count)| format!("{} {}", &weekday_name(*day)[..3], count))
                .collect();
            println_colored!(pal, pal.dim, "  {}", row.join("  "));
        }
        _ => println_colored!(pal, pal.dim, "  Best/worst day: no data"),
    }
}

pub fn handle_streaks(conn: &Connection, config: &AppConfig, id: i64) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let streak = Analytics::streaks(conn, id, Utc::now())?;
    match HabitRepo::get(conn, id)? {
        Some(habit) => {
            println_colored!(pal, pal.accent, "  {}", habit.name);
            print_streak(&pal, &streak, habit.periodicity);
        }
        None => {
            println_colored!(pal, pal.dim, "  No habit #{}", id);
            print_streak(&pal, &streak, Periodicity::Daily);
        }
    }
    Ok(())
}

pub fn handle_rates(conn: &Connection, config: &AppConfig, window: &str) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let window = RateWindow::from_str(window)?;
    let rates = Analytics::completion_rates(conn, window, Utc::now())?;

    println!();
    println_colored!(pal, pal.accent, "  Completion rates ({})", window.label());
    println!();
    if rates.is_empty() {
        println_colored!(pal, pal.dim, "  No habits yet");
    }
    for r in &rates {
        println!(
            "  {:>3}  {:<28}  {}{}{}  {:>4}",
            r.id,
            r.name,
            pal.for_rate(r.completion_rate),
            rate_bar(r.completion_rate, config.display.bar_width),
            pal.reset,
            format_percent(r.completion_rate)
        );
    }
    println!();
    Ok(())
}

pub fn handle_struggling(
    conn: &Connection,
    config: &AppConfig,
    threshold: Option<f64>,
    fraction: Option<f64>,
) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let struggling = Analytics::struggling(conn, threshold, fraction, Utc::now())?;

    println!();
    if struggling.is_empty() {
        println_colored!(pal, pal.green, "  ✓ No struggling habits");
        println!();
        return Ok(());
    }
    println_colored!(pal, pal.amber, "  Struggling habits");
    println!();
    for r in &struggling {
        println!(
            "  {:>3}  {:<28}  {}{:>4}{}",
            r.id,
            r.name,
            pal.for_rate(r.completion_rate),
            format_percent(r.completion_rate),
            pal.reset
        );
        if let Some(habit) = HabitRepo::get(conn, r.id)? {
            if habit.periodicity == Periodicity::Weekly {
                let profile = Analytics::day_profile(conn, habit.id)?;
                if let Some(best) = profile.best_day {
                    println_colored!(pal, pal.dim, "       usually done on {}", weekday_name(best));
                }
            }
        }
    }
    println!();
    Ok(())
}

pub fn handle_days(conn: &Connection, config: &AppConfig, id: i64) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let profile = Analytics::day_profile(conn, id)?;
    match HabitRepo::get(conn, id)? {
        Some(habit) if habit.periodicity == Periodicity::Daily => {
            println_colored!(pal, pal.dim, "  {} is a daily habit; day profiles apply to weekly habits", habit.name);
        }
        Some(habit) => {
            println_colored!(pal, pal.accent, "  {}", habit.name);
            print_day_profile(&pal, &profile);
        }
        None => println_colored!(pal, pal.dim, "  No habit #{}", id),
    }
    Ok(())
}

pub fn handle_prefs(
    conn: &Connection,
    config: &AppConfig,
    threshold: Option<f64>,
    fraction: Option<f64>,
) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let now = Utc::now();
    let prefs = if threshold.is_some() || fraction.is_some() {
        let updated = PreferencesRepo::update(conn, threshold, fraction, now)?;
        log::info!(
            "Preferences updated: threshold={} fraction={}",
            updated.struggle_threshold,
            updated.show_bottom_percent
        );
        println_colored!(pal, pal.green, "  ✓ Preferences saved");
        updated
    } else {
        PreferencesRepo::get(conn, now)?
    };

    println!("  Struggle threshold:  {}", format_percent(prefs.struggle_threshold));
    println!("  Bottom fraction:     {}", format_percent(prefs.show_bottom_percent));
    Ok(())
}

// ─── Seed / export / config ──────────────────────────────────────────────────

pub fn handle_seed(conn: &Connection, config: &AppConfig, weeks: u32, reset: bool) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let existing = HabitRepo::list(conn, None)?.len();
    if existing > 0 {
        if !reset {
            return Err(anyhow!(
                "Database already has {} habit(s). Use --reset to replace them with demo data",
                existing
            ));
        }
        HabitRepo::delete_all(conn)?;
        println_colored!(pal, pal.dim, "  Cleared {} existing habit(s)", existing);
    }

    let report = seed_demo_data(conn, weeks, Utc::now())?;
    println_colored!(
        pal,
        pal.green,
        "  ✓ Seeded {} habits with {} completions over {}",
        report.habits,
        report.completions,
        plural(weeks, "week")
    );
    Ok(())
}

#[derive(Serialize)]
struct ExportedHabit {
    #[serde(flatten)]
    habit: Habit,
    completions: Vec<Completion>,
    streak: Streak,
    lifetime_rate: f64,
    day_profile: DayProfile,
}

#[derive(Serialize)]
struct Export {
    exported_at: DateTime<Utc>,
    preferences: Preferences,
    habits: Vec<ExportedHabit>,
}

pub fn handle_export(conn: &Connection) -> Result<()> {
    let now = Utc::now();
    let mut habits = Vec::new();
    for habit in HabitRepo::list(conn, None)? {
        let lifetime_rate = Analytics::habit_rate(conn, habit.id, RateWindow::Lifetime, now)?
            .map(|r| r.completion_rate)
            .unwrap_or(0.0);
        habits.push(ExportedHabit {
            completions: CompletionRepo::list(conn, habit.id, None)?,
            streak: Analytics::streaks(conn, habit.id, now)?,
            lifetime_rate,
            day_profile: Analytics::day_profile(conn, habit.id)?,
            habit,
        });
    }

    let export = Export {
        exported_at: now,
        preferences: PreferencesRepo::get(conn, now)?,
        habits,
    };
    let json = serde_json::to_string_pretty(&export).context("Serializing export")?;
    println!("{}", json);
    Ok(())
}

pub fn handle_config(config: &AppConfig, db_path: &std::path::Path, init: bool) -> Result<()> {
    let pal = Palette::new(config.display.color);
    let path = AppConfig::config_path()?;
    if init {
        if path.exists() {
            println_colored!(pal, pal.dim, "  Config already exists at {:?}", path);
        } else {
            config.save_to(&path)?;
            println_colored!(pal, pal.green, "  ✓ Wrote default config to {:?}", path);
        }
    }
    println!("  Config file:  {:?}", path);
    println!("  Database:     {:?}", db_path);
    println!("  Colour:       {}", config.display.color);
    println!("  Bar width:    {}", config.display.bar_width);
    println!("  Date format:  {}", config.display.date_format);
    Ok(())
}
