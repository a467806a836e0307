//! Series sampling over a planned window.
//!
//! Walks the window grid and evaluates every series at each grid point. The
//! result is rebuilt from scratch on every call; nothing is cached between
//! calls, so identical inputs give identical charts.

use crate::aggregate::{display_label, group_by_label, SeriesNames};
use crate::decay::level;
use crate::window::{RangeSpec, WindowPlan};
use crate::{Error, Intake, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Colors cycled for series whose intakes carry no color of their own
pub const DEFAULT_PALETTE: [&str; 5] = ["#2563eb", "#e11d48", "#16a34a", "#f59e0b", "#8b5cf6"];

/// How intakes map onto chart series
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    /// One line per intake
    #[default]
    PerIntake,
    /// One line per display label, summing same-named intakes
    BySource,
}

impl FromStr for SeriesMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_intake" | "intake" => Ok(SeriesMode::PerIntake),
            "by_source" | "source" => Ok(SeriesMode::BySource),
            other => Err(Error::Config(format!(
                "unknown series mode {:?} (expected per_intake or by_source)",
                other
            ))),
        }
    }
}

/// Name and color of one chart line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeriesInfo {
    pub name: String,
    pub color: String,
}

/// Levels of every series at one grid instant
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SamplePoint {
    pub at: DateTime<Utc>,
    pub label: String,
    /// Series name to level, in series order
    pub values: Vec<(String, f64)>,
}

impl SamplePoint {
    pub fn value(&self, series: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == series)
            .map(|(_, v)| *v)
    }

    pub fn total(&self) -> f64 {
        self.values.iter().map(|(_, v)| v).sum()
    }
}

/// Chart-ready sample series
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub plan: WindowPlan,
    pub series: Vec<SeriesInfo>,
    /// Chronological; rendering relies on this order
    pub points: Vec<SamplePoint>,
    /// Grid point closest to `plan.now`, if it lies on the grid
    pub now_index: Option<usize>,
}

impl Chart {
    pub fn now_point(&self) -> Option<&SamplePoint> {
        self.now_index.and_then(|i| self.points.get(i))
    }

    /// Highest combined level over the window
    pub fn peak(&self) -> Option<&SamplePoint> {
        self.points
            .iter()
            .max_by(|a, b| a.total().total_cmp(&b.total()))
    }
}

/// Sample every series over `plan`.
///
/// Returns `None` when there are no intakes so callers can show a "no data"
/// state rather than a flat line. `format` turns a grid instant into its
/// label and is called once per grid point.
pub fn sample<F>(
    intakes: &[Intake],
    plan: &WindowPlan,
    mode: SeriesMode,
    format: F,
) -> Option<Chart>
where
    F: Fn(DateTime<Utc>) -> String,
{
    if intakes.is_empty() {
        tracing::debug!("No intakes to sample");
        return None;
    }

    let (series, assignment) = build_series(intakes, mode);

    let points: Vec<SamplePoint> = plan
        .grid()
        .map(|at| {
            let mut levels = vec![0.0; series.len()];
            for (intake, index) in intakes.iter().zip(&assignment) {
                levels[*index] += level(intake, at);
            }

            SamplePoint {
                at,
                label: format(at),
                values: series
                    .iter()
                    .map(|s| s.name.clone())
                    .zip(levels)
                    .collect(),
            }
        })
        .collect();

    tracing::debug!(
        "Sampled {} series over {} points",
        series.len(),
        points.len()
    );

    Some(Chart {
        plan: *plan,
        series,
        now_index: now_index(plan),
        points,
    })
}

/// Series metadata plus, per intake, the index of the series it feeds
fn build_series(intakes: &[Intake], mode: SeriesMode) -> (Vec<SeriesInfo>, Vec<usize>) {
    match mode {
        SeriesMode::PerIntake => {
            let mut names = SeriesNames::default();
            let mut series = Vec::with_capacity(intakes.len());

            for (index, intake) in intakes.iter().enumerate() {
                let name = names.claim(display_label(intake, index));

                series.push(SeriesInfo {
                    name,
                    color: series_color(intake.source_color.as_deref(), index),
                });
            }

            (series, (0..intakes.len()).collect())
        }
        SeriesMode::BySource => {
            let (labels, assignment) = group_by_label(intakes);
            let series = labels
                .into_iter()
                .enumerate()
                .map(|(group, name)| {
                    let color = intakes
                        .iter()
                        .zip(&assignment)
                        .filter(|(_, g)| **g == group)
                        .find_map(|(intake, _)| intake.source_color.as_deref());
                    SeriesInfo {
                        name,
                        color: series_color(color, group),
                    }
                })
                .collect();

            (series, assignment)
        }
    }
}

fn series_color(own: Option<&str>, position: usize) -> String {
    own.map(str::to_string)
        .unwrap_or_else(|| DEFAULT_PALETTE[position % DEFAULT_PALETTE.len()].to_string())
}

fn now_index(plan: &WindowPlan) -> Option<usize> {
    if plan.now < plan.start {
        return None;
    }
    let step = plan.interval_millis();
    let offset = (plan.now - plan.start).num_milliseconds();
    let index = ((offset + step / 2) / step) as usize;
    (index < plan.point_count()).then_some(index)
}

/// Default label format for `range`, rendered in `tz`
///
/// Ranges longer than a day include the date.
pub fn label_formatter<Tz>(range: RangeSpec, tz: Tz) -> impl Fn(DateTime<Utc>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let pattern = if range.total_hours() > 24 {
        "%b %-d %H:%M"
    } else {
        "%H:%M"
    };
    move |at| at.with_timezone(&tz).format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{plan, Anchor};
    use chrono::{Duration, FixedOffset};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    fn fmt_utc(range: RangeSpec) -> impl Fn(DateTime<Utc>) -> String {
        label_formatter(range, Utc)
    }

    #[test]
    fn test_empty_intakes_signal_no_data() {
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        assert!(sample(&[], &plan, SeriesMode::PerIntake, fmt_utc(RangeSpec::Day)).is_none());
    }

    #[test]
    fn test_single_intake_end_to_end() {
        crate::logging::init_test();

        let intakes = vec![Intake::new(95.0, t0())];
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart =
            sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(RangeSpec::Day)).unwrap();

        assert_eq!(chart.points.len(), 145);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "Drink 1");

        let at_intake = chart.points.iter().find(|p| p.at == t0()).unwrap();
        assert_eq!(at_intake.value("Drink 1").unwrap().round(), 95.0);
        assert_eq!(at_intake.label, "08:00");

        let later = chart
            .points
            .iter()
            .find(|p| p.at == t0() + Duration::hours(5))
            .unwrap();
        let remaining = later.value("Drink 1").unwrap();
        assert!((47.0..=48.0).contains(&remaining), "got {}", remaining);

        // Look-ahead half before the intake reads zero
        assert_eq!(chart.points[0].value("Drink 1"), Some(0.0));
    }

    #[test]
    fn test_sample_is_deterministic() {
        let intakes = vec![
            Intake::new(95.0, t0() - Duration::hours(3)).with_source("Coffee (8 oz)"),
            Intake::new(28.0, t0() + Duration::hours(1)).with_source("Green Tea"),
        ];
        let plan = plan(RangeSpec::TwoDays, t0(), Anchor::Centered).unwrap();

        let first = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range));
        let second = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range));
        assert_eq!(first, second);
    }

    #[test]
    fn test_points_are_chronological() {
        let intakes = vec![Intake::new(64.0, t0())];
        let plan = plan(RangeSpec::Week, t0(), Anchor::LookBack).unwrap();
        let chart = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range)).unwrap();
        assert!(chart.points.windows(2).all(|w| w[0].at < w[1].at));
    }

    #[test]
    fn test_per_intake_keeps_duplicate_labels_apart() {
        let intakes = vec![
            Intake::new(95.0, t0()).with_source("Coffee"),
            Intake::new(95.0, t0() + Duration::hours(2)).with_source("Coffee"),
        ];
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range)).unwrap();

        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Coffee (2)"]);
        assert_eq!(chart.points[0].values.len(), 2);
    }

    #[test]
    fn test_per_intake_suffix_skips_real_label() {
        let intakes = vec![
            Intake::new(95.0, t0()).with_source("Coffee"),
            Intake::new(95.0, t0() + Duration::hours(1)).with_source("Coffee"),
            Intake::new(64.0, t0() + Duration::hours(2)).with_source("Coffee (2)"),
        ];
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range)).unwrap();

        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Coffee (2)", "Coffee (2) (2)"]);

        let last = chart.points.last().unwrap();
        assert!(last.value("Coffee (2) (2)").unwrap() > 0.0);
    }

    #[test]
    fn test_by_source_sums_same_label() {
        let intakes = vec![
            Intake::new(100.0, t0()).with_source("Coffee"),
            Intake::new(100.0, t0()).with_source("Coffee"),
            Intake::new(47.0, t0()).with_source("Black Tea"),
        ];
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart = sample(&intakes, &plan, SeriesMode::BySource, fmt_utc(plan.range)).unwrap();

        assert_eq!(chart.series.len(), 2);
        let now = chart.now_point().unwrap();
        assert_eq!(now.value("Coffee"), Some(200.0));
        assert_eq!(now.value("Black Tea"), Some(47.0));
        assert_eq!(now.total(), 247.0);
    }

    #[test]
    fn test_series_colors() {
        let intakes = vec![
            Intake::new(95.0, t0()).with_color("#6f4e37"),
            Intake::new(95.0, t0()),
        ];
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range)).unwrap();
        assert_eq!(chart.series[0].color, "#6f4e37");
        assert_eq!(chart.series[1].color, DEFAULT_PALETTE[1]);
    }

    #[test]
    fn test_now_index() {
        let intakes = vec![Intake::new(95.0, t0())];

        let centered = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart =
            sample(&intakes, &centered, SeriesMode::PerIntake, fmt_utc(centered.range)).unwrap();
        assert_eq!(chart.now_index, Some(72));

        let look_back = plan(RangeSpec::Day, t0(), Anchor::LookBack).unwrap();
        let chart =
            sample(&intakes, &look_back, SeriesMode::PerIntake, fmt_utc(look_back.range)).unwrap();
        assert_eq!(chart.now_index, Some(144));
    }

    #[test]
    fn test_peak() {
        let intakes = vec![
            Intake::new(95.0, t0() - Duration::hours(2)),
            Intake::new(64.0, t0()),
        ];
        let plan = plan(RangeSpec::Day, t0(), Anchor::Centered).unwrap();
        let chart = sample(&intakes, &plan, SeriesMode::PerIntake, fmt_utc(plan.range)).unwrap();
        assert_eq!(chart.peak().unwrap().at, t0());
    }

    #[test]
    fn test_label_formats() {
        let at = Utc.with_ymd_and_hms(2024, 5, 10, 22, 30, 0).unwrap();
        assert_eq!(label_formatter(RangeSpec::Day, Utc)(at), "22:30");
        assert_eq!(label_formatter(RangeSpec::Week, Utc)(at), "May 10 22:30");

        let cet = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(label_formatter(RangeSpec::TwoDays, cet)(at), "May 11 00:30");
    }

    #[test]
    fn test_parse_series_mode() {
        assert_eq!("by-source".parse::<SeriesMode>().unwrap(), SeriesMode::BySource);
        assert_eq!("per_intake".parse::<SeriesMode>().unwrap(), SeriesMode::PerIntake);
        assert!("stacked".parse::<SeriesMode>().is_err());
    }
}
