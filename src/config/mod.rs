mod file_config;

pub use file_config::{EndpointsConfig, FileConfig};

use crate::notifications::CategoryId;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PANEL_MAX_ITEMS: usize = 10;
pub const DEFAULT_STATE_DB: &str = "notifications.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub state_db: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub panel_max_items: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub state_db: PathBuf,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub panel_max_items: usize,
    pub endpoints: EndpointSettings,
}

/// Backend route for each category; `None` means the category is not polled.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSettings {
    pub messages: Option<String>,
    pub partial_grades: Option<String>,
    pub report_cards: Option<String>,
    pub external_results: Option<String>,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            messages: Some("/api/communications/mine".to_string()),
            partial_grades: Some("/api/partial-grades/mine".to_string()),
            report_cards: Some("/api/report-cards/mine".to_string()),
            external_results: Some("/api/exam-results/mine".to_string()),
        }
    }
}

impl EndpointSettings {
    fn merge(file: EndpointsConfig) -> Self {
        let defaults = Self::default();
        let pick = |over: Option<String>, default: Option<String>| match over {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(path),
            None => default,
        };
        Self {
            messages: pick(file.messages, defaults.messages),
            partial_grades: pick(file.partial_grades, defaults.partial_grades),
            report_cards: pick(file.report_cards, defaults.report_cards),
            external_results: pick(file.external_results, defaults.external_results),
        }
    }

    /// Enabled `(category, path)` pairs, in category order.
    pub fn enabled(&self) -> Vec<(CategoryId, &str)> {
        [
            (CategoryId::Messages, &self.messages),
            (CategoryId::PartialGrades, &self.partial_grades),
            (CategoryId::ReportCards, &self.report_cards),
            (CategoryId::ExternalResults, &self.external_results),
        ]
        .into_iter()
        .filter_map(|(category, path)| path.as_deref().map(|p| (category, p)))
        .collect()
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let base_url = file
            .base_url
            .or_else(|| cli.base_url.clone())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("base_url must be specified via --base-url or in config file")
            })?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("base_url must be an http(s) URL: {}", base_url);
        }

        let auth_token = file.auth_token.or_else(|| cli.auth_token.clone());

        let state_db = file
            .state_db
            .map(PathBuf::from)
            .or_else(|| cli.state_db.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DB));

        let poll_interval_secs = file
            .poll_interval_secs
            .or(cli.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .or(cli.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }

        let panel_max_items = file
            .panel_max_items
            .or(cli.panel_max_items)
            .unwrap_or(DEFAULT_PANEL_MAX_ITEMS);

        let endpoints = EndpointSettings::merge(file.endpoints.unwrap_or_default());
        if endpoints.enabled().is_empty() {
            bail!("Every notification category is disabled in [endpoints]");
        }

        Ok(Self {
            base_url,
            auth_token,
            state_db,
            poll_interval_secs,
            request_timeout_secs,
            panel_max_items,
            endpoints,
        })
    }
}
