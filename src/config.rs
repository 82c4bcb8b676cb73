use std::{
    net::{IpAddr, SocketAddr},
    path::Path,
    time::Duration,
};

use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{
    constants::{
        DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_SWEEP_SECS, DEFAULT_SERVER_IP,
        DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_UPDOWN_API, MAX_CACHE_PERIOD_SECS, MAX_PROCS,
        MIN_CACHE_PERIOD_SECS, MIN_PORT, MIN_PROCS,
    },
    error::ConfigError,
    svg::Style,
};

const LOG_LEVELS: [&str; 5] = ["debug", "info", "warn", "error", "crit"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub main: MainConfig,
    pub updown: UpdownConfig,
    #[serde(default)]
    pub badge: BadgeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MainConfig {
    pub max_procs: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct UpdownConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BadgeConfig {
    #[serde(default = "default_style")]
    pub style: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a rendered badge stays valid.
    #[serde(default = "default_cache_period")]
    pub period: u64,
    /// Seconds between eviction sweeps.
    #[serde(default = "default_cache_sweep")]
    pub sweep: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_server_ip")]
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub redirect: String,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: String,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            period: default_cache_period(),
            sweep: default_cache_sweep(),
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_UPDOWN_API.to_string()
}

fn default_style() -> String {
    Style::Flat.as_str().to_string()
}

fn default_cache_period() -> u64 {
    MAX_CACHE_PERIOD_SECS
}

fn default_cache_sweep() -> u64 {
    DEFAULT_CACHE_SWEEP_SECS
}

fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

fn default_server_ip() -> String {
    DEFAULT_SERVER_IP.to_string()
}

fn default_shutdown_timeout() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Replaces file values with non-empty environment overrides.
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key
            && !key.trim().is_empty()
        {
            self.updown.api_key = key.trim().to_string();
        }
    }

    /// Checks every property and reports all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.updown.api_key.is_empty() {
            errors.push("updown.api-key must be set".to_string());
        } else if !is_read_only_key(&self.updown.api_key) {
            errors.push("updown.api-key must be a read-only key (ro- followed by 20 alphanumeric characters)".to_string());
        }

        if let Err(err) = self.api_url() {
            errors.push(format!("updown.api-url is not a valid URL: {err}"));
        }

        if let Some(procs) = self.main.max_procs
            && !(MIN_PROCS..=MAX_PROCS).contains(&procs)
        {
            errors.push(format!(
                "main.max-procs must be between {MIN_PROCS} and {MAX_PROCS}"
            ));
        }

        if let Err(err) = self.style() {
            errors.push(format!("badge.style: {err}"));
        }

        if !(MIN_CACHE_PERIOD_SECS..=MAX_CACHE_PERIOD_SECS).contains(&self.cache.period) {
            errors.push(format!(
                "cache.period must be between {MIN_CACHE_PERIOD_SECS} and {MAX_CACHE_PERIOD_SECS} seconds"
            ));
        }

        if self.cache.sweep == 0 {
            errors.push("cache.sweep must be at least 1 second".to_string());
        }

        if self.cache.capacity == 0 {
            errors.push("cache.capacity must be greater than 0".to_string());
        }

        if self.server.ip.parse::<IpAddr>().is_err() {
            errors.push(format!("server.ip '{}' is not an IP address", self.server.ip));
        }

        if self.server.port < MIN_PORT {
            errors.push(format!("server.port must be between {MIN_PORT} and 65535"));
        }

        if let Err(err) = self.redirect() {
            errors.push(format!("server.redirect: {err}"));
        }

        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            errors.push(format!(
                "log.level must be one of: {}",
                LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    pub fn style(&self) -> Result<Style, String> {
        self.badge.style.parse()
    }

    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.updown.api_url)
    }

    pub fn redirect(&self) -> Result<Option<String>, String> {
        if self.server.redirect.is_empty() {
            return Ok(None);
        }

        let url = Url::parse(&self.server.redirect).map_err(|err| err.to_string())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported URL scheme '{}'", url.scheme()));
        }

        Ok(Some(self.server.redirect.clone()))
    }

    pub fn listen_addr(&self) -> Option<SocketAddr> {
        let ip = self.server.ip.parse::<IpAddr>().ok()?;
        Some(SocketAddr::new(ip, self.server.port))
    }

    pub fn cache_period(&self) -> Duration {
        Duration::from_secs(self.cache.period)
    }

    pub fn cache_sweep(&self) -> Duration {
        Duration::from_secs(self.cache.sweep)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }

    pub fn log_filter(&self) -> LevelFilter {
        match self.log.level.as_str() {
            "debug" => LevelFilter::DEBUG,
            "warn" => LevelFilter::WARN,
            "error" | "crit" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        }
    }
}

fn is_read_only_key(key: &str) -> bool {
    key.strip_prefix("ro-")
        .is_some_and(|rest| rest.len() == 20 && rest.bytes().all(|b| b.is_ascii_alphanumeric()))
}
