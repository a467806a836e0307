//! Core domain types for the caffeine tracker.
//!
//! This module defines the records shared between the engine and its
//! collaborators:
//! - Intakes as the engine sees them and as the log stores them
//! - Drinks and the catalog they live in

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Intake Types
// ============================================================================

/// One consumption event as consumed by the metabolism engine.
///
/// The engine never mutates intakes; ownership stays with the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    /// Amount in mg (caffeine equivalent)
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub source_label: Option<String>,
    pub source_color: Option<String>,
}

impl Intake {
    pub fn new(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            amount,
            timestamp,
            source_label: None,
            source_color: None,
        }
    }

    pub fn with_source(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.source_color = Some(color.into());
        self
    }
}

/// Drink reference attached to a logged intake
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrinkRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A persisted intake (one line of the intake log)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: Uuid,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub drink: Option<DrinkRef>,
}

impl IntakeRecord {
    /// Create a new record, rejecting amounts the engine cannot model
    pub fn new(amount: f64, timestamp: DateTime<Utc>, drink: Option<DrinkRef>) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidIntake(format!(
                "amount must be a non-negative number of mg, got {}",
                amount
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            amount,
            timestamp,
            drink,
        })
    }
}

impl From<&IntakeRecord> for Intake {
    fn from(record: &IntakeRecord) -> Self {
        Intake {
            amount: record.amount,
            timestamp: record.timestamp,
            source_label: record.drink.as_ref().map(|d| d.name.clone()),
            source_color: record.drink.as_ref().and_then(|d| d.color.clone()),
        }
    }
}

/// Parse an RFC 3339 timestamp supplied at ingestion
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidIntake(format!("invalid timestamp {:?}: {}", s, e)))
}

// ============================================================================
// Drink and Catalog Types
// ============================================================================

/// A drink that can be logged
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    pub name: String,
    pub caffeine_mg: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

impl Drink {
    /// Reference stored alongside an intake of this drink
    pub fn to_ref(&self) -> DrinkRef {
        DrinkRef {
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// The set of drinks available for logging
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub drinks: Vec<Drink>,
}
