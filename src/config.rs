use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::loader::PropertyKeys;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub keys: PropertyKeys,
    /// Predefined categories searched when a single zone is selected
    pub categories: Vec<Category>,
    pub provider: ProviderConfig,
    pub export: ExportConfig,
}

/// Display label and the provider query it maps to
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub query: String,
}

impl Category {
    pub fn new(label: &str, query: &str) -> Self {
        Self {
            label: label.to_string(),
            query: query.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
}

pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("mall", "shopping_mall"),
        Category::new("school", "school"),
        Category::new("university", "university"),
        Category::new("public transport", "transit_station"),
        Category::new("point of interest", "tourist_attraction"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys: PropertyKeys::default(),
            categories: default_categories(),
            provider: ProviderConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            max_results: 20,
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "zone_places.csv".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.keys = config.keys.normalized();
        if config.categories.is_empty() {
            anyhow::bail!("Config must define at least one category");
        }
        Ok(config)
    }
}
