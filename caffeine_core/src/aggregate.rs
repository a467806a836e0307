//! Summing decayed levels across intakes.

use crate::decay::level;
use crate::Intake;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Total level of all intakes at `at`. Empty input yields 0.
pub fn total_level(intakes: &[Intake], at: DateTime<Utc>) -> f64 {
    intakes.iter().map(|intake| level(intake, at)).sum()
}

/// Display label of an intake: its source label, or `"Drink {n}"` (1-indexed)
pub fn display_label(intake: &Intake, index: usize) -> String {
    match named_source(intake) {
        Some(label) => label.to_string(),
        None => format!("Drink {}", index + 1),
    }
}

fn named_source(intake: &Intake) -> Option<&str> {
    intake
        .source_label
        .as_deref()
        .filter(|label| !label.trim().is_empty())
}

/// Hands out unique series names.
///
/// A name already claimed gets a ` (n)` suffix, with `n` counting up from 2
/// until the result is unused.
#[derive(Debug, Default)]
pub(crate) struct SeriesNames {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SeriesNames {
    pub(crate) fn claim(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }

        let suffix = self.next_suffix.entry(base.clone()).or_insert(2);
        loop {
            let candidate = format!("{} ({})", base, suffix);
            *suffix += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Group intakes by display label in first-seen order.
///
/// A drink literally named like a positional label (`"Drink 2"`) stays apart
/// from the unnamed intake at that position. Returns the unique group names
/// and, for each intake, the index of its group.
pub(crate) fn group_by_label(intakes: &[Intake]) -> (Vec<String>, Vec<usize>) {
    let mut keys: Vec<(String, bool)> = Vec::new();
    let mut assignment = Vec::with_capacity(intakes.len());

    for (index, intake) in intakes.iter().enumerate() {
        let key = (display_label(intake, index), named_source(intake).is_some());
        let group = match keys.iter().position(|k| *k == key) {
            Some(existing) => existing,
            None => {
                keys.push(key);
                keys.len() - 1
            }
        };
        assignment.push(group);
    }

    let mut names = SeriesNames::default();
    let labels = keys
        .into_iter()
        .map(|(label, _)| names.claim(label))
        .collect();

    (labels, assignment)
}

/// Levels at `at` summed per display label, in first-seen order
pub fn levels_by_source(intakes: &[Intake], at: DateTime<Utc>) -> Vec<(String, f64)> {
    let (labels, assignment) = group_by_label(intakes);
    let mut totals = vec![0.0; labels.len()];

    for (intake, group) in intakes.iter().zip(&assignment) {
        totals[*group] += level(intake, at);
    }

    labels.into_iter().zip(totals).collect()
}
