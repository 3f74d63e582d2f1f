use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

/// Format a 0..=1 rate as a whole percentage, e.g. "67%"
pub fn format_percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// Whether chrono can render every specifier in `pattern`
pub fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Format an instant with the configured strftime pattern, falling back to
/// RFC 3339 when the pattern can't be rendered
pub fn format_instant(instant: DateTime<Utc>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", instant.format(pattern)).is_err() {
        return instant.to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    out
}

/// Create a simple ASCII bar for a 0..=1 rate
pub fn rate_bar(rate: f64, width: usize) -> String {
    let ratio = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

/// Pluralize a count, "1 day" / "3 days"
pub fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
