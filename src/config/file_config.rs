use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub state_db: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub panel_max_items: Option<usize>,

    pub endpoints: Option<EndpointsConfig>,
}

/// Per-category routes. An empty string disables the category.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub messages: Option<String>,
    pub partial_grades: Option<String>,
    pub report_cards: Option<String>,
    pub external_results: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
