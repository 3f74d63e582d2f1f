use crate::models::{clamp_preference, HabitRate};

/// Habits whose rate is strictly below `threshold`, narrowed to the worst
/// `fraction` of them (at least one). Both parameters are clamped into
/// [0.1, 1.0]. Equal rates keep their input order.
pub fn rank_struggling(rates: &[HabitRate], threshold: f64, fraction: f64) -> Vec<HabitRate> {
    let threshold = clamp_preference(threshold);
    let fraction = clamp_preference(fraction);

    let mut below: Vec<HabitRate> = rates
        .iter()
        .filter(|r| r.completion_rate < threshold)
        .cloned()
        .collect();
    if below.is_empty() {
        return below;
    }

    let keep = ((below.len() as f64 * fraction).floor() as usize).max(1);
    below.sort_by(|a, b| a.completion_rate.total_cmp(&b.completion_rate));
    below.truncate(keep);
    below
}
