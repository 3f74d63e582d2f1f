//! Expected-versus-actual completion ratios.
//!
//! Three window policies are used by different views:
//! - fixed: the last 30 days, whatever the habit's age
//! - age-bounded: the last 30 days, shortened to the habit's age (min 1 day)
//! - lifetime: every whole period since the habit was created

use chrono::{DateTime, Duration, Utc};

use crate::analytics::calendar::{period_length_days, whole_days_between};
use crate::models::Periodicity;
use crate::utils::time::start_of_day;

pub const RECENT_WINDOW_DAYS: i64 = 30;

/// `completed / expected`, capped at 1.0, and 0 when nothing is expected.
fn capped_ratio(completed: i64, expected: f64) -> f64 {
    if expected <= 0.0 || completed <= 0 {
        return 0.0;
    }
    (completed as f64 / expected).min(1.0)
}

/// Start of the fixed window ending at `today`.
pub fn fixed_window_start(today: DateTime<Utc>) -> DateTime<Utc> {
    today - Duration::days(RECENT_WINDOW_DAYS)
}

pub fn fixed_window_rate(completed: i64, periodicity: Periodicity) -> f64 {
    let expected = RECENT_WINDOW_DAYS as f64 / period_length_days(periodicity) as f64;
    capped_ratio(completed, expected)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    /// Length in days, between 1 and 30
    pub days: i64,
    /// Midnight of the first day in the window
    pub start: DateTime<Utc>,
}

/// Per-habit window: the habit's age in whole days, clamped to 1..=30,
/// ending with the day containing `today`.
pub fn analysis_window(created_at: DateTime<Utc>, today: DateTime<Utc>) -> AnalysisWindow {
    let days = whole_days_between(created_at, today).clamp(1, RECENT_WINDOW_DAYS);
    let first_day = today.date_naive() - Duration::days(days - 1);
    AnalysisWindow {
        days,
        start: start_of_day(first_day),
    }
}

pub fn age_bounded_rate(completed: i64, periodicity: Periodicity, window: AnalysisWindow) -> f64 {
    let expected = window.days as f64 / period_length_days(periodicity) as f64;
    capped_ratio(completed, expected)
}

pub fn lifetime_rate(
    completed: i64,
    periodicity: Periodicity,
    created_at: DateTime<Utc>,
    today: DateTime<Utc>,
) -> f64 {
    let total_days = whole_days_between(created_at, today);
    let expected = total_days.div_euclid(period_length_days(periodicity));
    if expected <= 0 {
        // Not a single whole period has passed yet
        return if completed > 0 { 1.0 } else { 0.0 };
    }
    capped_ratio(completed, expected as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn fixed_window_daily_and_weekly() {
        assert_eq!(fixed_window_rate(15, Periodicity::Daily), 0.5);
        assert_eq!(fixed_window_rate(45, Periodicity::Daily), 1.0);
        let weekly = fixed_window_rate(3, Periodicity::Weekly);
        assert!((weekly - 3.0 * 7.0 / 30.0).abs() < 1e-9);
        assert_eq!(fixed_window_rate(0, Periodicity::Weekly), 0.0);
    }

    #[test]
    fn fixed_window_spans_thirty_days() {
        let today = at(2024, 1, 31);
        assert_eq!(fixed_window_start(today), at(2024, 1, 1));
    }

    #[test]
    fn analysis_window_follows_habit_age() {
        let today = at(2024, 1, 31) + Duration::hours(10);
        let window = analysis_window(at(2024, 1, 26), today);
        assert_eq!(window.days, 5);
        assert_eq!(window.start, at(2024, 1, 27));

        let old = analysis_window(at(2023, 6, 1), today);
        assert_eq!(old.days, 30);
        assert_eq!(old.start, at(2024, 1, 2));
    }

    #[test]
    fn analysis_window_has_one_day_floor() {
        let today = at(2024, 1, 31) + Duration::hours(10);
        let window = analysis_window(today - Duration::hours(2), today);
        assert_eq!(window.days, 1);
        assert_eq!(window.start, at(2024, 1, 31));

        // created in the future still gets one day
        let window = analysis_window(today + Duration::days(3), today);
        assert_eq!(window.days, 1);
    }

    #[test]
    fn age_bounded_judges_young_habits_over_their_age() {
        let today = at(2024, 1, 31);
        let window = analysis_window(at(2024, 1, 26), today);
        assert_eq!(age_bounded_rate(5, Periodicity::Daily, window), 1.0);
        assert_eq!(age_bounded_rate(1, Periodicity::Daily, window), 0.2);
        assert_eq!(age_bounded_rate(0, Periodicity::Daily, window), 0.0);
    }

    #[test]
    fn lifetime_rate_for_habit_created_today() {
        let now = at(2024, 1, 10) + Duration::hours(9);
        let created = now - Duration::hours(1);
        assert_eq!(lifetime_rate(1, Periodicity::Daily, created, now), 1.0);
        assert_eq!(lifetime_rate(0, Periodicity::Daily, created, now), 0.0);
    }

    #[test]
    fn lifetime_rate_floors_expected_periods() {
        let today = at(2024, 1, 10);
        let daily = lifetime_rate(2, Periodicity::Daily, at(2024, 1, 1), today);
        assert!((daily - 2.0 / 9.0).abs() < 1e-9);

        // 40 days is five whole weeks
        let weekly = lifetime_rate(2, Periodicity::Weekly, at(2023, 12, 1), today);
        assert!((weekly - 0.4).abs() < 1e-9);

        assert_eq!(lifetime_rate(50, Periodicity::Daily, at(2024, 1, 1), today), 1.0);
    }

    #[test]
    fn lifetime_weekly_habit_younger_than_a_week() {
        let today = at(2024, 1, 10);
        assert_eq!(lifetime_rate(1, Periodicity::Weekly, at(2024, 1, 5), today), 1.0);
        assert_eq!(lifetime_rate(0, Periodicity::Weekly, at(2024, 1, 5), today), 0.0);
    }
}
