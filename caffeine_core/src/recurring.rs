//! Recurring daily windows (e.g. sleep) resolved into concrete intervals.
//!
//! One interval is produced per local calendar day, starting with the day
//! that contains the window start and stopping once a day's local midnight
//! reaches the window end. Spans whose end time is earlier than their start
//! time finish on the following day. Intervals are not merged; renderers that
//! need shading confined to the chart use [`clip_to_window`].

use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Daily start/end time-of-day pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringWindowSpec {
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
}

impl RecurringWindowSpec {
    pub fn new(start_of_day: NaiveTime, end_of_day: NaiveTime) -> Self {
        Self {
            start_of_day,
            end_of_day,
        }
    }

    /// Build from two "HH:MM" strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?))
    }

    /// True when the span ends on the day after it starts
    pub fn wraps_midnight(&self) -> bool {
        self.end_of_day < self.start_of_day
    }
}

/// Parse an "HH:MM" time of day
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| Error::InvalidTimeOfDay(format!("{:?}: {} (expected HH:MM)", s, e)))
}

/// One concrete occurrence of a recurring window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedInterval {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Resolve `spec` into one interval per local day touched by the window
pub fn resolve<Tz: TimeZone>(
    spec: &RecurringWindowSpec,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    tz: &Tz,
) -> Vec<ResolvedInterval> {
    let mut intervals = Vec::new();
    if window_end <= window_start {
        return intervals;
    }

    let mut day = window_start.with_timezone(tz).date_naive();

    loop {
        let Some(midnight) = day.and_hms_opt(0, 0, 0) else {
            break;
        };
        if local_instant(tz, midnight) >= window_end {
            break;
        }

        let end_day = if spec.wraps_midnight() {
            match day.succ_opt() {
                Some(next) => next,
                None => break,
            }
        } else {
            day
        };

        intervals.push(ResolvedInterval {
            start: local_instant(tz, day.and_time(spec.start_of_day)),
            end: local_instant(tz, end_day.and_time(spec.end_of_day)),
        });

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    tracing::debug!(
        "Resolved {} recurring intervals between {} and {}",
        intervals.len(),
        window_start,
        window_end
    );

    intervals
}

/// Clip intervals to `[start, end]`, dropping those entirely outside
pub fn clip_to_window(
    intervals: &[ResolvedInterval],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<ResolvedInterval> {
    intervals
        .iter()
        .filter_map(|interval| {
            let clipped = ResolvedInterval {
                start: interval.start.max(start),
                end: interval.end.min(end),
            };
            (clipped.start < clipped.end).then_some(clipped)
        })
        .collect()
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times take the earlier instant; times skipped by a DST gap move
/// forward one hour.
fn local_instant<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}
