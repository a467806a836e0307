//! User preferences persistence with file locking.
//!
//! Holds the sleep schedule shown as an overlay on the chart. Stored as
//! JSON next to the intake log.

use crate::recurring::{parse_time_of_day, RecurringWindowSpec};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// User preference record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_sleep_start")]
    pub sleep_start: String,
    #[serde(default = "default_sleep_end")]
    pub sleep_end: String,
}

fn default_sleep_start() -> String {
    "22:00".into()
}

fn default_sleep_end() -> String {
    "06:00".into()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sleep_start: default_sleep_start(),
            sleep_end: default_sleep_end(),
        }
    }
}

impl Preferences {
    /// Sleep schedule as a validated recurring window
    pub fn sleep_window(&self) -> Result<RecurringWindowSpec> {
        RecurringWindowSpec::parse(&self.sleep_start, &self.sleep_end)
    }

    /// Update the sleep schedule, validating both times first
    pub fn set_sleep(&mut self, start: Option<&str>, end: Option<&str>) -> Result<()> {
        if let Some(start) = start {
            parse_time_of_day(start)?;
        }
        if let Some(end) = end {
            parse_time_of_day(end)?;
        }
        if let Some(start) = start {
            self.sleep_start = start.trim().to_string();
        }
        if let Some(end) = end {
            self.sleep_end = end.trim().to_string();
        }
        Ok(())
    }

    /// Load preferences from a file with shared locking
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No preferences file found, using defaults");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open preferences {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock preferences {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read preferences {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<Preferences>(&contents) {
            Ok(prefs) => {
                tracing::debug!("Loaded preferences from {:?}", path);
                Ok(prefs)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse preferences {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save preferences atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "preferences path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved preferences to {:?}", path);
        Ok(())
    }

    /// Load, modify and save back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut Preferences) -> Result<()>,
    {
        let mut prefs = Self::load(path)?;
        f(&mut prefs)?;
        prefs.save(path)?;
        Ok(prefs)
    }
}
