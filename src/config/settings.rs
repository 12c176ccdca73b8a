//! Application settings loaded from config.toml
//!
//! The file sets the currency label printed next to amounts and the list of budget
//! categories with their percentage share. Both keys are optional; a missing file
//! means the built-in defaults are used.

use crate::core::category::{self, CategoryBudget};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable pointing at the settings file
pub const CONFIG_PATH_VAR: &str = "BUDGET_CONFIG";

/// Settings file used when [`CONFIG_PATH_VAR`] is not set
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Currency label used when none is configured
pub const DEFAULT_CURRENCY: &str = "FCFA";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Currency label printed after amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Budget categories to seed
    #[serde(default = "default_category_configs")]
    pub categories: Vec<CategoryConfig>,
}

/// Configuration for a single category
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CategoryConfig {
    /// Name of the category
    pub name: String,
    /// Share of the monthly budget, in percent
    pub percent: f64,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_category_configs() -> Vec<CategoryConfig> {
    category::default_categories()
        .into_iter()
        .map(|c| CategoryConfig {
            name: c.name,
            percent: c.allocated_percent,
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            categories: default_category_configs(),
        }
    }
}

impl Config {
    /// Builds the in-memory category models described by this configuration.
    #[must_use]
    pub fn category_budgets(&self) -> Vec<CategoryBudget> {
        self.categories
            .iter()
            .map(|c| CategoryBudget::new(c.name.clone(), c.percent))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config {
                message: "At least one category must be configured".to_string(),
            });
        }

        if let Some(bad) = self
            .categories
            .iter()
            .find(|c| c.name.trim().is_empty() || !c.percent.is_finite() || c.percent < 0.0)
        {
            return Err(Error::Config {
                message: format!("Invalid category entry: {bad:?}"),
            });
        }

        if !category::verify_total(&self.category_budgets()) {
            let total: f64 = self.categories.iter().map(|c| c.percent).sum();
            warn!("Category percentages add up to {total:.2}%, not 100%");
        }

        Ok(())
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A category entry is empty or has a negative percentage
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads settings from `path`, or returns the defaults when the file does not exist.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        debug!("Loading configuration from {:?}", path);
        load_config(path)
    } else {
        debug!("No configuration file at {:?}, using defaults", path);
        Ok(Config::default())
    }
}

/// Loads settings from the path in `BUDGET_CONFIG`, or `./config.toml`.
pub fn load_app_config() -> Result<Config> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_or_default(path)
}
