//! Configuration file handling.
//!
//! This module provides loading and saving of hulud-detect configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/hulud-detect/config.toml`
//! - macOS: `~/Library/Application Support/hulud-detect/config.toml`
//! - Windows: `%APPDATA%\hulud-detect\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! cache_ttl_minutes = 30
//! fetch_timeout_secs = 30
//! csv_feed_url = "https://github.com/wiz-sec-public/wiz-research-iocs/raw/refs/heads/main/reports/shai-hulud-2-packages.csv"
//! json_feed_url = "https://intel.example.com/compromised-packages.json"
//! offline_dir = "ioc"
//! persist_cache = true
//! default_format = "table"
//! full_scan = false
//! upload_url = "https://collector.example.com/reports"
//! ```

use crate::intel::{FeedSource, IntelSources, DEFAULT_TTL_MINUTES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Wiz Research list of packages compromised in the second Shai-Hulud wave.
pub const DEFAULT_CSV_FEED_URL: &str =
    "https://github.com/wiz-sec-public/wiz-research-iocs/raw/refs/heads/main/reports/shai-hulud-2-packages.csv";

/// Application configuration.
///
/// Every field has a default, so a partial file (or none at all) is valid.
///
/// # Example
///
/// ```no_run
/// use hulud_detect::Config;
///
/// let config = Config::load().unwrap();
/// println!("Feeds are reused for {} minutes", config.cache_ttl_minutes);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a fetched feed is reused, in minutes.
    ///
    /// Default: 30
    pub cache_ttl_minutes: u64,

    /// Hard timeout for each feed download and the report upload.
    ///
    /// Default: 30
    pub fetch_timeout_secs: u64,

    /// CSV feed: one compromised package name per row, all versions.
    pub csv_feed_url: Option<String>,

    /// JSON feed: package name to compromised versions (or `"*"`).
    ///
    /// Default: unset, the offline snapshot is used.
    pub json_feed_url: Option<String>,

    /// Directory holding offline snapshots written by the feed updater.
    /// Relative paths are resolved against the working directory.
    ///
    /// Default: `ioc`
    pub offline_dir: PathBuf,

    /// Keep fetched feeds on disk between runs.
    ///
    /// Default: true
    pub persist_cache: bool,

    /// Output format when no `--format` flag is given.
    ///
    /// Valid values: "table", "csv", "json"
    /// Default: "table"
    pub default_format: String,

    /// Also scan package-manager caches and Node version manager installs.
    ///
    /// Default: false
    pub full_scan: bool,

    /// Endpoint the JSON report is POSTed to after each scan.
    ///
    /// Default: unset, nothing is uploaded.
    pub upload_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: DEFAULT_TTL_MINUTES as u64,
            fetch_timeout_secs: 30,
            csv_feed_url: Some(DEFAULT_CSV_FEED_URL.to_string()),
            json_feed_url: None,
            offline_dir: PathBuf::from("ioc"),
            persist_cache: true,
            default_format: "table".to_string(),
            full_scan: false,
            upload_url: None,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to the config file, creating the parent
    /// directory if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// ```
    /// use hulud_detect::Config;
    ///
    /// assert!(Config::config_path().ends_with("hulud-detect/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hulud-detect")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        let minutes = i64::try_from(self.cache_ttl_minutes).unwrap_or(i64::MAX);
        chrono::Duration::minutes(minutes.min(i64::MAX / 60_000))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn intel_sources(&self) -> IntelSources {
        IntelSources {
            csv: FeedSource::csv(non_empty(&self.csv_feed_url)),
            json: FeedSource::json(non_empty(&self.json_feed_url)),
        }
    }
}

/// `csv_feed_url = ""` disables the feed like leaving it unset.
fn non_empty(url: &Option<String>) -> Option<String> {
    url.as_ref()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}
