//! Period boundaries for daily and weekly habits.
//!
//! Everything here works on UTC instants. Weeks are ISO weeks starting on
//! Monday; the streak engine, the duplicate check and the "done this week"
//! status all go through these functions.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::Periodicity;
use crate::utils::time::start_of_day;

pub fn period_length_days(periodicity: Periodicity) -> i64 {
    match periodicity {
        Periodicity::Daily => 1,
        Periodicity::Weekly => 7,
    }
}

/// First calendar day of the period containing `instant`.
pub fn period_start_date(periodicity: Periodicity, instant: DateTime<Utc>) -> NaiveDate {
    let date = instant.date_naive();
    match periodicity {
        Periodicity::Daily => date,
        Periodicity::Weekly => {
            date - Duration::days(date.weekday().num_days_from_monday() as i64)
        }
    }
}

/// Inclusive instant range covering every day of the period containing `instant`.
pub fn period_bounds(
    periodicity: Periodicity,
    instant: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = period_start_date(periodicity, instant);
    let next = first + Duration::days(period_length_days(periodicity));
    (
        start_of_day(first),
        start_of_day(next) - Duration::microseconds(1),
    )
}

/// Whole days elapsed from `from` to `to`, rounded toward negative infinity.
pub fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let delta = to - from;
    let days = delta.num_days();
    if delta < Duration::days(days) {
        days - 1
    } else {
        days
    }
}

pub fn gap_exceeds_period(
    periodicity: Periodicity,
    earlier: DateTime<Utc>,
    later: DateTime<Utc>,
) -> bool {
    whole_days_between(earlier, later) > period_length_days(periodicity)
}
