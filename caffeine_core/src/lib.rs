#![forbid(unsafe_code)]

//! Core domain model and metabolism engine for the caffeine tracker.
//!
//! This crate provides:
//! - Domain types (intakes, drinks, chart samples, overlay intervals)
//! - The metabolism engine (decay, aggregation, window planning, sampling)
//! - Recurring daily windows (sleep overlays)
//! - Persistence collaborators (intake log, preferences, config)
//! - Drink catalog, history filtering and CSV chart export

pub mod types;
pub mod error;
pub mod decay;
pub mod aggregate;
pub mod window;
pub mod sampler;
pub mod recurring;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod intake_log;
pub mod preferences;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use decay::{level, HALF_LIFE_MS};
pub use aggregate::{levels_by_source, total_level};
pub use window::{plan, Anchor, RangeSpec, WindowPlan};
pub use sampler::{label_formatter, sample, Chart, SamplePoint, SeriesInfo, SeriesMode};
pub use recurring::{clip_to_window, resolve, RecurringWindowSpec, ResolvedInterval};
pub use catalog::{build_catalog, get_default_catalog};
pub use config::Config;
pub use intake_log::{read_intakes, remove_intake, IntakeSink, JsonlSink};
pub use preferences::Preferences;
pub use history::{load_recent_intakes, Period};
