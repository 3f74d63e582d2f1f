use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PREFERENCE_MIN: f64 = 0.1;
pub const PREFERENCE_MAX: f64 = 1.0;
pub const DEFAULT_STRUGGLE_THRESHOLD: f64 = 0.75;
pub const DEFAULT_SHOW_BOTTOM_PERCENT: f64 = 0.25;

/// Clamp a struggle threshold or bottom fraction into [0.1, 1.0].
/// NaN falls back to the lower bound.
pub fn clamp_preference(value: f64) -> f64 {
    if value.is_nan() {
        PREFERENCE_MIN
    } else {
        value.clamp(PREFERENCE_MIN, PREFERENCE_MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub struggle_threshold: f64,
    pub show_bottom_percent: f64,
    pub updated_at: DateTime<Utc>,
}

impl Preferences {
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            struggle_threshold: DEFAULT_STRUGGLE_THRESHOLD,
            show_bottom_percent: DEFAULT_SHOW_BOTTOM_PERCENT,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(clamp_preference(0.0), 0.1);
        assert_eq!(clamp_preference(-3.0), 0.1);
        assert_eq!(clamp_preference(1.7), 1.0);
        assert_eq!(clamp_preference(0.5), 0.5);
        assert_eq!(clamp_preference(f64::NAN), 0.1);
    }
}
