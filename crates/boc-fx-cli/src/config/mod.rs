//! Configuration loading and resolution.

use boc_fx::{FailurePolicy, RetryPolicy, ScrapeConfig, SiteLayout};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "BOCFX_CONFIG";

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bocfx.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// Settings of the command-line front-end.
///
/// Every field is optional in the file; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub headless: bool,
    pub search_all_pages: bool,
    pub output_dir: PathBuf,
    /// Overrides the search page URL.
    pub url: Option<String>,
    pub wait_timeout_ms: u64,
    /// Pause after clicks that make the page reload.
    pub settle_ms: u64,
    pub retry: RetryPolicy,
    pub failure_policy: FailurePolicy,
    pub chromium_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            headless: true,
            search_all_pages: true,
            output_dir: PathBuf::from("."),
            url: None,
            wait_timeout_ms: 30_000,
            settle_ms: 500,
            retry: RetryPolicy::default(),
            failure_policy: FailurePolicy::default(),
            chromium_path: None,
        }
    }
}

impl Settings {
    /// Read a settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from the resolved path, or fall back to defaults when there is none.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match resolve_config_path(explicit) {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn layout(&self) -> SiteLayout {
        let mut layout = SiteLayout::default();
        if let Some(url) = &self.url {
            layout.url = url.clone();
        }
        layout
    }

    /// Engine configuration for the given date range.
    ///
    /// Without dates the range is the three days ending `today`.
    pub fn scrape_config(
        &self,
        today: NaiveDate,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<ScrapeConfig, ConfigError> {
        let defaults = ScrapeConfig::ending_on(today);
        let start = from.unwrap_or(defaults.start_date);
        let end = to.unwrap_or(defaults.end_date);
        if start > end {
            return Err(ConfigError::DateRange { start, end });
        }

        let mut config = ScrapeConfig::new(start, end);
        config.layout = self.layout();
        config.search_all_pages = self.search_all_pages;
        config.retry = self.retry;
        config.failure_policy = self.failure_policy;
        Ok(config)
    }
}

/// Resolve the settings file path.
///
/// An explicit path wins, then `BOCFX_CONFIG`, then `./bocfx.json` if it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_config = PathBuf::from(DEFAULT_CONFIG_FILE);
    cwd_config.exists().then_some(cwd_config)
}
