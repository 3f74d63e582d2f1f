use chrono::{DateTime, Utc};

use crate::analytics::calendar::gap_exceeds_period;
use crate::models::{Periodicity, Streak};

/// Longest and current streak for one habit's completions as of `today`.
///
/// Completions are split into groups wherever two neighbours are more than
/// one period apart. Group size counts completions, not elapsed days, so
/// duplicate completions inside one period each add to the streak. The last
/// group is only current if `today` is within one period of it.
pub fn compute_streaks(
    completions: &[DateTime<Utc>],
    periodicity: Periodicity,
    today: DateTime<Utc>,
) -> Streak {
    let mut sorted = completions.to_vec();
    sorted.sort();

    let Some(&last) = sorted.last() else {
        return Streak::default();
    };

    let groups = streak_groups(&sorted, periodicity);
    let longest = groups.iter().copied().max().unwrap_or(0);
    let current = if gap_exceeds_period(periodicity, last, today) {
        0
    } else {
        groups.last().copied().unwrap_or(0)
    };

    Streak {
        longest_streak: longest,
        current_streak: current,
    }
}

/// Sizes of consecutive streak groups over an ascending sequence.
pub fn streak_groups(sorted: &[DateTime<Utc>], periodicity: Periodicity) -> Vec<u32> {
    if sorted.is_empty() {
        return Vec::new();
    }

    let mut groups = vec![1u32];
    for pair in sorted.windows(2) {
        if gap_exceeds_period(periodicity, pair[0], pair[1]) {
            groups.push(1);
        } else if let Some(size) = groups.last_mut() {
            *size += 1;
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn empty_sequence_has_no_streak() {
        let streak = compute_streaks(&[], Periodicity::Daily, day(5));
        assert_eq!(streak, Streak::default());
    }

    #[test]
    fn single_completion_is_a_streak_of_one() {
        let streak = compute_streaks(&[day(5)], Periodicity::Daily, day(5));
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn gap_splits_groups() {
        let completions = [day(1), day(2), day(4)];
        assert_eq!(streak_groups(&completions, Periodicity::Daily), vec![2, 1]);

        let streak = compute_streaks(&completions, Periodicity::Daily, day(5));
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn gap_free_sequence_is_fully_current() {
        let completions: Vec<_> = (1..=10).map(day).collect();
        let streak = compute_streaks(&completions, Periodicity::Daily, day(10));
        assert_eq!(streak.longest_streak, 10);
        assert_eq!(streak.current_streak, 10);
    }

    #[test]
    fn lapsed_streak_is_not_current() {
        let completions = [day(1), day(2), day(3)];
        let streak = compute_streaks(&completions, Periodicity::Daily, day(6));
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.current_streak, 0);
    }

    #[test]
    fn one_period_after_last_completion_still_counts() {
        let completions = [day(1), day(2)];
        let streak = compute_streaks(&completions, Periodicity::Daily, day(3) + Duration::hours(23));
        assert_eq!(streak.current_streak, 2);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let completions = [day(4), day(1), day(2)];
        let streak = compute_streaks(&completions, Periodicity::Daily, day(4));
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn same_day_duplicates_each_count() {
        let completions = [day(1), day(1) + Duration::hours(6), day(2)];
        let streak = compute_streaks(&completions, Periodicity::Daily, day(2));
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.current_streak, 3);
    }

    #[test]
    fn weekly_tolerates_up_to_seven_days() {
        let completions = [day(1), day(8), day(15), day(24)];
        let streak = compute_streaks(&completions, Periodicity::Weekly, day(30));
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn weekly_lapses_after_more_than_seven_days() {
        let completions = [day(1), day(8)];
        let streak = compute_streaks(&completions, Periodicity::Weekly, day(16));
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.current_streak, 0);
    }
}
