//! Run configuration loaded from `config.yaml`.
//!
//! Every field has a default, so a missing or empty file is a valid
//! configuration. Command-line flags are applied on top with
//! [`Config::apply_cli`]. The API key is never read from this file.

use crate::cli::Cli;
use crate::error::{DigestError, Result};
use chrono::{Datelike, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/completions";
pub const DEFAULT_MODEL: &str = "text-davinci-003";
pub const DEFAULT_INDEX_URL: &str = "https://edition.cnn.com/markets";
pub const DEFAULT_SITE_BASE_URL: &str = "https://edition.cnn.com";
pub const DEFAULT_CONTENT_SELECTOR: &str = ".article__content-container";
pub const DEFAULT_TITLE_MARKER: &str = "|";

/// Order in which the sentiment stage walks the summary list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SentimentOrder {
    /// Last produced summary first.
    #[default]
    Reverse,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion endpoint.
    pub api_url: String,
    pub model: String,
    /// Listing page the article links are scraped from.
    pub index_url: String,
    /// Base URL relative hrefs are resolved against.
    pub site_base_url: String,
    /// Substring an href must contain to be kept. Defaults to the current year.
    pub link_filter: Option<String>,
    /// CSS selector of the article body region.
    pub content_selector: String,
    /// Everything from this marker onward is cut from article titles.
    pub title_marker: String,
    pub sentiment_order: SentimentOrder,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            index_url: DEFAULT_INDEX_URL.to_string(),
            site_base_url: DEFAULT_SITE_BASE_URL.to_string(),
            link_filter: None,
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            title_marker: DEFAULT_TITLE_MARKER.to_string(),
            sentiment_order: SentimentOrder::default(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl Config {
    /// `<config dir>/headline_digest/config.yaml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("headline_digest").join("config.yaml"))
    }

    /// Parse a YAML document. Blank input yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| DigestError::Config(e.to_string()))
    }

    /// Load the config at `path`; a file that does not exist yields the defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file found; using defaults");
            return Ok(Self::default());
        }
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&yaml)?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Overlay the flags the user passed on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.api_url {
            self.api_url = url.clone();
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(url) = &cli.index_url {
            self.index_url = url.clone();
        }
        if let Some(filter) = &cli.filter {
            self.link_filter = Some(filter.clone());
        }
        if let Some(order) = cli.sentiment_order {
            self.sentiment_order = order;
        }
    }

    /// The effective link filter token.
    pub fn link_filter(&self) -> String {
        self.link_filter
            .clone()
            .unwrap_or_else(|| Local::now().year().to_string())
    }
}
