use chrono::{DateTime, Datelike, Utc};

use crate::models::{DayProfile, Periodicity, WorstDay, WEEK};

/// Best and worst weekday for a weekly habit.
///
/// Daily habits and empty histories get an empty profile. The best day is
/// the first maximum in Monday..Sunday order. The worst day is only judged
/// among weekdays that were actually observed and needs at least two of
/// them and a unique minimum; otherwise it is `NotApplicable`.
pub fn profile_weekdays(completions: &[DateTime<Utc>], periodicity: Periodicity) -> DayProfile {
    if periodicity != Periodicity::Weekly || completions.is_empty() {
        return DayProfile::empty();
    }

    let mut tallies = [0u32; 7];
    for c in completions {
        tallies[c.weekday().num_days_from_monday() as usize] += 1;
    }

    let mut best = 0usize;
    for (i, &count) in tallies.iter().enumerate().skip(1) {
        if count > tallies[best] {
            best = i;
        }
    }

    DayProfile {
        best_day: Some(WEEK[best]),
        worst_day: Some(worst_observed_day(&tallies)),
        tallies,
    }
}

fn worst_observed_day(tallies: &[u32; 7]) -> WorstDay {
    let observed: Vec<(usize, u32)> = tallies
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, count)| count > 0)
        .collect();
    if observed.len() < 2 {
        return WorstDay::NotApplicable;
    }

    let Some(min) = observed.iter().map(|&(_, count)| count).min() else {
        return WorstDay::NotApplicable;
    };
    let mut at_min = observed.iter().filter(|&&(_, count)| count == min);
    match (at_min.next(), at_min.next()) {
        (Some(&(idx, _)), None) => WorstDay::Day(WEEK[idx]),
        _ => WorstDay::NotApplicable,
    }
}
