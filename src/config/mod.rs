//! Configuration management for Signpost.
//!
//! Configuration is read from `~/.config/signpost/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is
//! created. Missing fields fall back to defaults, so a partial file is fine.

pub mod selectors;

pub use selectors::Selectors;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scrape: ScrapeConfig,
    pub selectors: Selectors,
}

/// Settings for the browser session and the scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Base URL of the quiz site; chapter and image links are resolved
    /// against this.
    pub base_url: String,

    /// Path of the index page listing all chapters, relative to `base_url`.
    pub index_path: String,

    /// Timeout for waiting on selectors and navigation, in seconds
    /// (default: 30)
    pub timeout_secs: u64,

    /// Wait time after page load for dynamic content in milliseconds
    /// (default: 1000)
    pub wait_after_load_ms: u64,

    /// Maximum concurrent image downloads per chapter (default: 5)
    pub image_concurrency: usize,

    /// Timeout for a single image download, in seconds (default: 10)
    pub image_timeout_secs: u64,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            base_url: "https://drive.govt.nz".to_string(),
            index_path: "/learner-licence/interactive-road-code".to_string(),
            timeout_secs: 30,
            wait_after_load_ms: 1000,
            image_concurrency: 5,
            image_timeout_secs: 10,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScrapeConfig {
    pub fn index_url(&self) -> String {
        format!("{}{}", self.base_url, self.index_path)
    }

    /// Resolve a (possibly relative) link against the base URL.
    pub fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.base_url, href)
        }
    }

    /// Get the selector/navigation wait timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    /// Get the image download timeout as a Duration
    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/signpost/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("signpost").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Signpost Configuration
#
# All fields are optional; missing fields use built-in defaults.
# Selector overrides live under [selectors] and only need changing when
# the site's markup changes.

[scrape]
# Run browser in headless mode (no visible window)
headless = true

# Site to scrape; chapter and image links are resolved against this
base_url = "https://drive.govt.nz"
index_path = "/learner-licence/interactive-road-code"

# Selector/navigation wait timeout in seconds
timeout_secs = 30

# Wait time after page load for dynamic content (milliseconds)
wait_after_load_ms = 1000

# Maximum concurrent image downloads per chapter
image_concurrency = 5

# Timeout for a single image download, in seconds
image_timeout_secs = 10
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
