//! Herald configuration.
//!
//! Configuration can be loaded from:
//! - a TOML file (`$HERALD_CONFIG`, default `~/.config/herald/config.toml`)
//! - environment variables (`HERALD_*` prefixed)
//!
//! Values of the form `${VAR}` inside the TOML file are substituted from the
//! environment before parsing, so secrets such as the session cookie can stay
//! out of the file.
//!
//! # Example
//!
//! ```toml
//! preferences_path = "/home/ana/.config/herald/preferences.json"
//!
//! [server]
//! base_url = "https://oraculo.example.com"
//! session_cookie = "${HERALD_SESSION_COOKIE}"
//!
//! [identity]
//! user_id = 42
//! is_admin = true
//!
//! [toast]
//! capacity = 5
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for crate::Error {
    fn from(e: ConfigError) -> Self {
        crate::Error::Config(e.to_string())
    }
}

/// Backend endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the web application.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// CSRF token sent on mutating requests.
    pub csrf_token: Option<String>,
    /// Raw `Cookie` header value carrying the authenticated session.
    pub session_cookie: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SERVER_URL.to_string(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            csrf_token: None,
            session_cookie: None,
        }
    }
}

impl ServerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "server.base_url cannot be empty".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "server.base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "server.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Who the current user is, as the page would have embedded it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Authenticated user id; `None` for anonymous sessions.
    pub user_id: Option<i64>,
    /// Whether the user holds admin privilege.
    pub is_admin: bool,
}

/// Toast queue tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub capacity: usize,
    pub display_timeout_ms: u64,
    pub dismiss_delay_ms: u64,
    pub show_delay_ms: u64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::TOAST_CAPACITY,
            display_timeout_ms: defaults::TOAST_DISPLAY_TIMEOUT_MS,
            dismiss_delay_ms: defaults::TOAST_DISMISS_DELAY_MS,
            show_delay_ms: defaults::TOAST_SHOW_DELAY_MS,
        }
    }
}

impl ToastConfig {
    pub fn display_timeout(&self) -> Duration {
        Duration::from_millis(self.display_timeout_ms)
    }

    pub fn dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.dismiss_delay_ms)
    }

    pub fn show_delay(&self) -> Duration {
        Duration::from_millis(self.show_delay_ms)
    }
}

/// Unread badge polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub poll_interval_secs: u64,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::BADGE_POLL_INTERVAL_SECS,
        }
    }
}

/// Notification list paging and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub per_page: u32,
    pub refresh_interval_secs: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            per_page: defaults::NOTIFICATION_PAGE_SIZE,
            refresh_interval_secs: defaults::LIST_REFRESH_INTERVAL_SECS,
        }
    }
}

/// Audit log paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub per_page: u32,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            per_page: defaults::ADMIN_LOG_PAGE_SIZE,
        }
    }
}

/// Push connection behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Fixed delay between a dropped session and the next attempt.
    pub reconnect_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: defaults::RECONNECT_DELAY_MS,
        }
    }
}

/// Main herald configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub toast: ToastConfig,
    pub badge: BadgeConfig,
    pub list: ListConfig,
    pub logs: LogsConfig,
    pub connection: ConnectionConfig,
    /// Where persisted preferences live; defaults next to the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<PathBuf>,
}

impl HeraldConfig {
    /// Directory holding herald's config and preferences.
    ///
    /// Returns: ~/.config/herald
    pub fn config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("herald");
        path
    }

    /// Get the default config file path, honouring `HERALD_CONFIG`.
    pub fn default_config_path() -> PathBuf {
        env::var("HERALD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Load configuration from the default path, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading herald config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text (after `${VAR}` substitution).
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let content = Self::substitute_env_vars(content);
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `HERALD_BASE_URL` | `http://127.0.0.1:5000` | Backend base URL |
    /// | `HERALD_TIMEOUT_SECS` | `30` | HTTP timeout |
    /// | `HERALD_CSRF_TOKEN` | (none) | CSRF token for mutations |
    /// | `HERALD_SESSION_COOKIE` | (none) | Session cookie header value |
    /// | `HERALD_USER_ID` | (none) | Joins the user room when set |
    /// | `HERALD_IS_ADMIN` | `false` | Joins the admin room |
    /// | `HERALD_TOAST_CAPACITY` | `5` | Live toast limit |
    /// | `HERALD_BADGE_POLL_SECS` | `60` | Unread-count poll interval |
    /// | `HERALD_PER_PAGE` | `20` | Notification list page size |
    /// | `HERALD_RECONNECT_DELAY_MS` | `1000` | Delay before reconnecting |
    /// | `HERALD_PREFERENCES` | (config dir) | Preferences file path |
    pub fn from_env() -> Self {
        let server = ServerConfig {
            base_url: env::var("HERALD_BASE_URL")
                .unwrap_or_else(|_| defaults::SERVER_URL.to_string()),
            timeout_secs: parse_env("HERALD_TIMEOUT_SECS").unwrap_or(defaults::REQUEST_TIMEOUT_SECS),
            csrf_token: env::var("HERALD_CSRF_TOKEN").ok(),
            session_cookie: env::var("HERALD_SESSION_COOKIE").ok(),
        };

        let identity = IdentityConfig {
            user_id: parse_env("HERALD_USER_ID"),
            is_admin: env::var("HERALD_IS_ADMIN")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
        };

        let toast = ToastConfig {
            capacity: parse_env("HERALD_TOAST_CAPACITY").unwrap_or(defaults::TOAST_CAPACITY),
            ..ToastConfig::default()
        };

        let badge = BadgeConfig {
            poll_interval_secs: parse_env("HERALD_BADGE_POLL_SECS")
                .unwrap_or(defaults::BADGE_POLL_INTERVAL_SECS),
        };

        let list = ListConfig {
            per_page: parse_env("HERALD_PER_PAGE").unwrap_or(defaults::NOTIFICATION_PAGE_SIZE),
            ..ListConfig::default()
        };

        let connection = ConnectionConfig {
            reconnect_delay_ms: parse_env("HERALD_RECONNECT_DELAY_MS")
                .unwrap_or(defaults::RECONNECT_DELAY_MS),
        };

        Self {
            server,
            identity,
            toast,
            badge,
            list,
            logs: LogsConfig::default(),
            connection,
            preferences_path: env::var("HERALD_PREFERENCES").ok().map(PathBuf::from),
        }
    }

    /// Resolved preferences file path.
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join(defaults::PREFERENCES_FILE))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;

        if self.toast.capacity == 0 {
            return Err(ConfigError::Validation(
                "toast.capacity must be at least 1".to_string(),
            ));
        }
        if self.toast.display_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "toast.display_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.badge.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "badge.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.list.per_page == 0 || self.logs.per_page == 0 {
            return Err(ConfigError::Validation(
                "per_page must be at least 1".to_string(),
            ));
        }
        if self.list.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "list.refresh_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Substitute environment variables in the format ${VAR_NAME}.
    fn substitute_env_vars(content: &str) -> String {
        let re = match regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return content.to_string(),
        };
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
