use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to updown API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned status code {0}")]
    Status(u16),
    #[error("can't decode {what} info: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read configuration file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("can't parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),
}
