//! Configuration management.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Main application configuration.
///
/// This is loaded from `~/.config/nessus-pilot/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Appliance location
    pub appliance: ApplianceConfig,
    /// Web console and REST API credentials
    pub credentials: Credentials,
    /// REST API transport settings
    pub api: ApiConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Polling budgets for the scan lifecycle
    pub lifecycle: LifecycleConfig,
    /// What the runner binary should do
    pub run: RunConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `NESSUS_URL`: appliance base URL
    /// - `NESSUS_USERNAME` / `NESSUS_PASSWORD`: web console login
    /// - `NESSUS_ACCESS_KEY` / `NESSUS_SECRET_KEY`: REST API keys
    /// - `NESSUS_HEADLESS`: browser headless mode (true/false)
    /// - `NESSUS_VERIFY_TLS`: certificate verification (true/false)
    /// - `NESSUS_SCREENSHOT_DIR`: directory for failure screenshots
    /// - `NESSUS_SCAN_NAME`: scan the runner operates on
    /// - `NESSUS_TARGETS`: comma separated target override
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("NESSUS_URL") {
            self.appliance.url = val;
            tracing::debug!("Override appliance.url from env");
        }
        if let Some(val) = lookup("NESSUS_USERNAME") {
            self.credentials.username = val;
        }
        if let Some(val) = lookup("NESSUS_PASSWORD") {
            self.credentials.password = val;
        }
        if let Some(val) = lookup("NESSUS_ACCESS_KEY") {
            self.credentials.access_key = val;
        }
        if let Some(val) = lookup("NESSUS_SECRET_KEY") {
            self.credentials.secret_key = val;
        }

        if let Some(val) = lookup("NESSUS_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("NESSUS_VERIFY_TLS") {
            if let Ok(verify) = val.parse() {
                self.api.verify_tls = verify;
                tracing::debug!("Override api.verify_tls from env: {}", verify);
            }
        }

        if let Some(val) = lookup("NESSUS_SCREENSHOT_DIR") {
            self.browser.screenshot_dir = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("NESSUS_SCAN_NAME") {
            self.run.scan_name = val;
        }

        if let Some(val) = lookup("NESSUS_TARGETS") {
            self.run.targets = val
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect();
        }
    }

    /// Check the values that have no usable default.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.appliance.url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "appliance.url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
            field: "appliance.url".to_string(),
            reason: e.to_string(),
        })?;

        if self.credentials.access_key.is_empty() || self.credentials.secret_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "credentials".to_string(),
                reason: "access_key and secret_key are required".to_string(),
            });
        }

        if self.lifecycle.poll_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lifecycle.poll_interval_minutes".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/nessus-pilot/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "nessus-pilot", "nessus-pilot")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Appliance location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplianceConfig {
    /// Base URL of the Nessus host, e.g. `https://nessus.local:8834`
    pub url: String,
}

impl ApplianceConfig {
    /// Base URL without a trailing slash, ready for path concatenation.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }
}

/// Web console login and REST API key pair.
///
/// Secrets are wiped from memory on drop and never printed by `Debug`.
///
/// Defaults are per field: a container-level default would move fields out
/// of a `Drop` value.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Web console username
    #[serde(default)]
    pub username: String,
    /// Web console password
    #[serde(default)]
    pub password: String,
    /// REST API access key
    #[serde(default)]
    pub access_key: String,
    /// REST API secret key
    #[serde(default)]
    pub secret_key: String,
}

impl Credentials {
    /// Value of the `X-ApiKeys` header.
    #[must_use]
    pub fn api_keys_header(&self) -> String {
        format!(
            "accessKey={}; secretKey={}",
            self.access_key, self.secret_key
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// REST API transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Verify the appliance TLS certificate. Disable only for self-signed
    /// appliance certificates.
    pub verify_tls: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout_secs: 30,
            user_agent: concat!("nessus-pilot/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Accept the appliance's self-signed certificate in the browser
    pub ignore_https_errors: bool,
    /// Where to save a page screenshot when a run fails; unset disables it
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            ignore_https_errors: true,
            screenshot_dir: None,
        }
    }
}

/// Polling budgets for the scan lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long a launched scan may take to reach `running`, in seconds
    pub start_timeout_secs: u64,
    /// Poll period while waiting for `running`, in seconds
    pub start_poll_secs: u64,
    /// How long a running scan may take to finish, in minutes
    pub completion_timeout_minutes: u64,
    /// Poll period while the scan is running, in minutes
    pub poll_interval_minutes: u64,
    /// Retry budget for each web console element, in seconds
    pub element_timeout_secs: u32,
    /// Pause after a web console launch, in seconds
    pub launch_settle_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 900,
            start_poll_secs: 15,
            completion_timeout_minutes: 360,
            poll_interval_minutes: 5,
            element_timeout_secs: 5,
            launch_settle_secs: 10,
        }
    }
}

/// What the runner binary operates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Name of the scan to launch and wait for
    pub scan_name: String,
    /// Optional target override; empty means the scan's default targets
    pub targets: Vec<String>,
}
