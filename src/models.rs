use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Unknown,
    Status,
    Uptime,
    Apdex,
}

impl CheckKind {
    pub fn from_segment(segment: &str) -> Self {
        match segment {
            "status.svg" => Self::Status,
            "uptime.svg" => Self::Uptime,
            "apdex.svg" => Self::Apdex,
            _ => Self::Unknown,
        }
    }

    /// Numeric code used in cache keys.
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Status => 1,
            Self::Uptime => 2,
            Self::Apdex => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Status => "status",
            Self::Uptime => "uptime",
            Self::Apdex => "apdex",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CheckStatus {
    pub uptime: f64,
    #[serde(rename = "down")]
    pub is_down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CheckApdex {
    #[serde(rename = "apdex")]
    pub value: f64,
}
