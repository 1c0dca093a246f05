use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::FormatError;

/// Display labels for civilization keys.
///
/// The defaults need to be updated when new civs get added to the game;
/// deployments can also layer overrides on top with [`CivNames::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct CivNames {
    names: HashMap<String, String>,
}

impl Default for CivNames {
    fn default() -> Self {
        let names = [
            ("mongols", "Mongols"),
            ("rus", "Rus"),
            ("english", "English"),
            ("french", "French"),
            ("holy_roman_empire", "HRE"),
            ("abbasid_dynasty", "Abbasid"),
            ("chinese", "Chinese"),
            ("delhi_sultanate", "Delhi"),
        ]
        .into_iter()
        .map(|(key, label)| (key.to_string(), label.to_string()))
        .collect();
        CivNames { names }
    }
}

impl CivNames {
    /// Unknown civs fall back to their raw key.
    pub fn label<'a>(&'a self, civ: &'a str) -> &'a str {
        self.names.get(civ).map_or(civ, String::as_str)
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.names.extend(overrides);
        self
    }

    /// Reads a JSON object of `{"civ_key": "Label"}` overrides and applies them to the defaults.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let text = fs::read_to_string(path)?;
        let overrides: HashMap<String, String> = serde_json::from_str(&text).map_err(|e| {
            FormatError::Config(format!(
                "civ names file {} is not a JSON object of strings: {}",
                path.display(),
                e
            ))
        })?;
        info!(
            "Loaded {} civ name override(s) from {}",
            overrides.len(),
            path.display()
        );
        Ok(CivNames::default().with_overrides(overrides))
    }
}

/// Source of "now" for age calculations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatterConfig {
    pub civ_names: CivNames,
    pub clock: Clock,
}
