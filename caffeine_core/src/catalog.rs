//! Default drink catalog.
//!
//! Built-in drinks with typical caffeine content, plus any custom drinks
//! declared in the config file.

use crate::config::DrinksConfig;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached built-in catalog
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached built-in catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Built-in catalog extended with the custom drinks from config
pub fn build_catalog(drinks: &DrinksConfig) -> Catalog {
    let mut catalog = get_default_catalog().clone();
    for custom in &drinks.custom {
        catalog.drinks.push(Drink {
            name: custom.name.clone(),
            caffeine_mg: custom.caffeine_mg,
            color: custom.color.clone(),
            is_custom: true,
        });
    }
    catalog
}

fn build_default_catalog_internal() -> Catalog {
    let builtin = [
        ("Coffee (8 oz)", 95.0, "#6f4e37"),
        ("Espresso Shot", 64.0, "#3b2f2f"),
        ("Black Tea", 47.0, "#8b4513"),
        ("Green Tea", 28.0, "#4caf50"),
        ("Cola (12 oz)", 34.0, "#b71c1c"),
        ("Energy Drink (8 oz)", 80.0, "#fbc02d"),
    ];

    Catalog {
        drinks: builtin
            .iter()
            .map(|(name, mg, color)| Drink {
                name: (*name).into(),
                caffeine_mg: *mg,
                color: Some((*color).into()),
                is_custom: false,
            })
            .collect(),
    }
}

impl Catalog {
    /// Find a drink by name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Drink> {
        let wanted = name.trim().to_lowercase();
        self.drinks.iter().find(|d| d.name.to_lowercase() == wanted)
    }

    /// Validate catalog integrity
    ///
    /// Returns a list of problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for drink in &self.drinks {
            if drink.name.trim().is_empty() {
                errors.push("Drink with empty name".to_string());
                continue;
            }
            if !seen.insert(drink.name.to_lowercase()) {
                errors.push(format!("Duplicate drink name '{}'", drink.name));
            }
            if !drink.caffeine_mg.is_finite() || drink.caffeine_mg < 0.0 {
                errors.push(format!(
                    "Drink '{}' has invalid caffeine amount {}",
                    drink.name, drink.caffeine_mg
                ));
            }
        }

        errors
    }
}
