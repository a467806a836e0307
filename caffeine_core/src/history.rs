//! Intake history queries.
//!
//! Loads logged intakes and filters them by the periods offered in the
//! history view (today, last 7 days, last month, everything).

use crate::{Error, Intake, IntakeRecord, Result};
use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use std::path::Path;
use std::str::FromStr;

/// History period filter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Period {
    /// Since local midnight
    #[default]
    Today,
    /// Last 7 days
    Week,
    /// Last calendar month
    Month,
    All,
}

impl Period {
    /// Earliest instant included, or `None` for no lower bound
    pub fn since<Tz: TimeZone>(self, now: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
        match self {
            Period::Today => {
                let midnight = now.with_timezone(tz).date_naive().and_hms_opt(0, 0, 0)?;
                tz.from_local_datetime(&midnight)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::All => None,
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" | "day" => Ok(Period::Today),
            "week" | "7d" => Ok(Period::Week),
            "month" | "30d" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(Error::Other(format!(
                "unknown period {:?} (expected today, week, month or all)",
                other
            ))),
        }
    }
}

/// Load intakes logged at or after `now - lookback`, newest first
pub fn load_recent_intakes(
    log_path: &Path,
    now: DateTime<Utc>,
    lookback: Duration,
) -> Result<Vec<IntakeRecord>> {
    let cutoff = now - lookback;
    let mut records: Vec<_> = crate::intake_log::read_intakes(log_path)?
        .into_iter()
        .filter(|r| r.timestamp >= cutoff)
        .collect();

    sort_newest_first(&mut records);

    tracing::info!(
        "Loaded {} intakes from the last {} hours",
        records.len(),
        lookback.num_hours()
    );
    Ok(records)
}

/// Records within `period`, newest first
pub fn filter_period<Tz: TimeZone>(
    records: &[IntakeRecord],
    period: Period,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<IntakeRecord> {
    let since = period.since(now, tz);
    let mut filtered: Vec<_> = records
        .iter()
        .filter(|r| since.map_or(true, |s| r.timestamp >= s))
        .cloned()
        .collect();
    sort_newest_first(&mut filtered);
    filtered
}

/// Engine intakes in chronological order, so positional labels count up
/// from the earliest intake
pub fn to_intakes(records: &[IntakeRecord]) -> Vec<Intake> {
    let mut ordered: Vec<_> = records.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);
    ordered.into_iter().map(Intake::from).collect()
}

fn sort_newest_first(records: &mut [IntakeRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
