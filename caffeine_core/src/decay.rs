//! First-order decay of a single intake.
//!
//! The remaining level after `t` is `amount * 0.5^(t / HALF_LIFE)`. Levels are
//! never rounded here; callers round at display time.

use crate::Intake;
use chrono::{DateTime, Duration, Utc};

/// Caffeine half-life in milliseconds (5 hours)
pub const HALF_LIFE_MS: i64 = 5 * 60 * 60 * 1000;

/// Caffeine half-life as a duration
pub fn half_life() -> Duration {
    Duration::milliseconds(HALF_LIFE_MS)
}

/// Remaining level of one intake at instant `at`
///
/// Intakes later than `at` contribute nothing.
pub fn level(intake: &Intake, at: DateTime<Utc>) -> f64 {
    let elapsed = at - intake.timestamp;
    if elapsed < Duration::zero() {
        return 0.0;
    }
    level_for(intake.amount, elapsed)
}

/// Remaining level of `amount` after `elapsed`
pub fn level_for(amount: f64, elapsed: Duration) -> f64 {
    if elapsed < Duration::zero() {
        return 0.0;
    }
    let half_lives = elapsed.num_milliseconds() as f64 / HALF_LIFE_MS as f64;
    (amount * 0.5_f64.powf(half_lives)).max(0.0)
}
