//! Window planning: chart bounds and sampling interval.
//!
//! The range selector fixes both the window length and the sample interval
//! so rendered point counts stay roughly constant (145-169 points).

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart range selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSpec {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "48h")]
    TwoDays,
    #[serde(rename = "72h")]
    ThreeDays,
    #[serde(rename = "1w")]
    Week,
}

impl RangeSpec {
    pub const ALL: [RangeSpec; 4] = [
        RangeSpec::Day,
        RangeSpec::TwoDays,
        RangeSpec::ThreeDays,
        RangeSpec::Week,
    ];

    /// Total window length in hours
    pub fn total_hours(self) -> i64 {
        match self {
            RangeSpec::Day => 24,
            RangeSpec::TwoDays => 48,
            RangeSpec::ThreeDays => 72,
            RangeSpec::Week => 168,
        }
    }

    /// Sample interval in minutes
    pub fn interval_minutes(self) -> i64 {
        match self {
            RangeSpec::Day => 10,
            RangeSpec::TwoDays => 20,
            RangeSpec::ThreeDays => 30,
            RangeSpec::Week => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RangeSpec::Day => "24h",
            RangeSpec::TwoDays => "48h",
            RangeSpec::ThreeDays => "72h",
            RangeSpec::Week => "1w",
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "24h" => Ok(RangeSpec::Day),
            "48h" => Ok(RangeSpec::TwoDays),
            "72h" => Ok(RangeSpec::ThreeDays),
            "1w" | "168h" => Ok(RangeSpec::Week),
            other => Err(Error::InvalidRange(format!(
                "unknown range {:?} (expected 24h, 48h, 72h or 1w)",
                other
            ))),
        }
    }
}

/// Where the window sits relative to `now`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Half look-back, half look-ahead projection
    #[default]
    Centered,
    /// Window ends at `now`
    LookBack,
}

impl FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "centered" | "centred" => Ok(Anchor::Centered),
            "look_back" | "lookback" => Ok(Anchor::LookBack),
            other => Err(Error::Config(format!(
                "unknown anchor {:?} (expected centered or look_back)",
                other
            ))),
        }
    }
}

/// Sampling window bounds and interval
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPlan {
    pub range: RangeSpec,
    /// Reference instant the window was planned around
    pub now: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: Duration,
}

impl WindowPlan {
    pub fn interval_millis(&self) -> i64 {
        self.interval.num_milliseconds()
    }

    /// Number of grid points: `ceil((end - start) / interval) + 1`
    pub fn point_count(&self) -> usize {
        let span = (self.end - self.start).num_milliseconds();
        let step = self.interval_millis();
        let steps = (span + step - 1) / step;
        steps as usize + 1
    }

    /// Grid instants from `start`, the last one at or after `end`
    pub fn grid(&self) -> Grid {
        Grid {
            start: self.start,
            interval: self.interval,
            next: 0,
            count: self.point_count(),
        }
    }
}

/// Iterator over the grid instants of a [`WindowPlan`]
///
/// Holds no shared state; call `plan.grid()` again to restart from `start`.
#[derive(Clone, Debug)]
pub struct Grid {
    start: DateTime<Utc>,
    interval: Duration,
    next: usize,
    count: usize,
}

impl Iterator for Grid {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let at = self.start + self.interval * self.next as i32;
        self.next += 1;
        Some(at)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Grid {}

/// Plan the sampling window for `range` around `now`
pub fn plan(range: RangeSpec, now: DateTime<Utc>, anchor: Anchor) -> Result<WindowPlan> {
    let total = Duration::hours(range.total_hours());
    let interval = Duration::minutes(range.interval_minutes());

    let (start, end) = match anchor {
        Anchor::Centered => (now - total / 2, now + total / 2),
        Anchor::LookBack => (now - total, now),
    };

    if end <= start || interval <= Duration::zero() {
        return Err(Error::InvalidRange(format!(
            "range {} yields an empty window",
            range
        )));
    }

    tracing::debug!(
        "Planned {} window {} .. {} every {} min",
        range,
        start,
        end,
        interval.num_minutes()
    );

    Ok(WindowPlan {
        range,
        now,
        start,
        end,
        interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_day_window() {
        let plan = plan(RangeSpec::Day, now(), Anchor::Centered).unwrap();
        assert_eq!(plan.end - plan.start, Duration::hours(24));
        assert_eq!(plan.interval_millis(), 10 * 60 * 1000);
        assert_eq!(plan.start, now() - Duration::hours(12));
        assert_eq!(plan.end, now() + Duration::hours(12));
        assert_eq!(plan.point_count(), 145);
    }

    #[test]
    fn test_week_window() {
        let plan = plan(RangeSpec::Week, now(), Anchor::Centered).unwrap();
        assert_eq!(plan.end - plan.start, Duration::hours(168));
        assert_eq!(plan.interval_millis(), 60 * 60 * 1000);
        assert_eq!(plan.point_count(), 169);
    }

    #[test]
    fn test_intervals_per_range() {
        let expected = [(RangeSpec::TwoDays, 20, 145), (RangeSpec::ThreeDays, 30, 145)];
        for (range, minutes, points) in expected {
            let plan = plan(range, now(), Anchor::Centered).unwrap();
            assert_eq!(plan.interval, Duration::minutes(minutes));
            assert_eq!(plan.point_count(), points);
        }
    }

    #[test]
    fn test_look_back_ends_at_now() {
        let plan = plan(RangeSpec::TwoDays, now(), Anchor::LookBack).unwrap();
        assert_eq!(plan.now, now());
        assert_eq!(plan.end, now());
        assert_eq!(plan.start, now() - Duration::hours(48));
    }

    #[test]
    fn test_grid_covers_window() {
        let plan = plan(RangeSpec::Day, now(), Anchor::Centered).unwrap();
        let points: Vec<_> = plan.grid().collect();
        assert_eq!(points.len(), plan.point_count());
        assert_eq!(points[0], plan.start);
        assert_eq!(*points.last().unwrap(), plan.end);
        assert!(points.windows(2).all(|w| w[1] - w[0] == plan.interval));
    }

    #[test]
    fn test_grid_is_restartable() {
        let plan = plan(RangeSpec::ThreeDays, now(), Anchor::LookBack).unwrap();
        let first: Vec<_> = plan.grid().collect();
        let second: Vec<_> = plan.grid().collect();
        assert_eq!(first, second);
        assert_eq!(plan.grid().len(), first.len());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("24h".parse::<RangeSpec>().unwrap(), RangeSpec::Day);
        assert_eq!("1W".parse::<RangeSpec>().unwrap(), RangeSpec::Week);
        assert!(matches!(
            "12h".parse::<RangeSpec>(),
            Err(Error::InvalidRange(_))
        ));
        for range in RangeSpec::ALL {
            assert_eq!(range.as_str().parse::<RangeSpec>().unwrap(), range);
        }
    }

    #[test]
    fn test_parse_anchor() {
        assert_eq!("look-back".parse::<Anchor>().unwrap(), Anchor::LookBack);
        assert_eq!("centered".parse::<Anchor>().unwrap(), Anchor::Centered);
        assert!("sideways".parse::<Anchor>().is_err());
    }
}
