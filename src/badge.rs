use std::sync::Arc;

use axum::body::Bytes;
use tracing::{debug, error};

use crate::{
    cache::BadgeCache,
    color::ramp,
    constants::{COLOR_CRITICAL, COLOR_INACTIVE, COLOR_SUCCESS, UNKNOWN_TOKEN},
    models::{CheckApdex, CheckKind, CheckStatus},
    svg::{Badge, Style},
    updown::StatusFetcher,
};

const UPTIME_FLOOR: f64 = 70.0;
const UPTIME_SPAN: f64 = 30.0;
const APDEX_FLOOR: f64 = 0.7;
const APDEX_SPAN: f64 = 0.3;
const APDEX_CEILING: f64 = 0.995;

/// Text and color of a badge before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeContent {
    pub label: &'static str,
    pub value: String,
    pub color: String,
}

impl BadgeContent {
    fn new(label: &'static str, value: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            color: color.into(),
        }
    }

    fn unknown(label: &'static str) -> Self {
        Self::new(label, "unknown", COLOR_INACTIVE)
    }
}

/// Turns a check token and kind into badge bytes, memoizing every result
/// (including failures) for the cache period.
pub struct BadgeResolver {
    cache: BadgeCache,
    fetcher: Arc<dyn StatusFetcher>,
    style: Style,
}

impl BadgeResolver {
    pub fn new(cache: BadgeCache, fetcher: Arc<dyn StatusFetcher>, style: Style) -> Self {
        Self {
            cache,
            fetcher,
            style,
        }
    }

    pub async fn resolve(&self, token: &str, kind: CheckKind) -> Bytes {
        // Garbage requests share a single cache slot.
        let token = if kind == CheckKind::Unknown {
            UNKNOWN_TOKEN
        } else {
            token
        };

        let key = cache_key(token, kind);
        if let Some(svg) = self.cache.get(&key).await {
            return svg;
        }

        debug!("badge cache miss for key '{key}'");

        let content = match kind {
            CheckKind::Unknown => BadgeContent::unknown("status"),
            CheckKind::Status => match self.fetcher.status(token).await {
                Ok(status) => status_content(&status),
                Err(err) => {
                    error!("can't get status info for token '{token}': {err}");
                    BadgeContent::unknown("status")
                }
            },
            CheckKind::Uptime => match self.fetcher.status(token).await {
                Ok(status) => uptime_content(&status),
                Err(err) => {
                    error!("can't get status info for token '{token}': {err}");
                    BadgeContent::unknown("uptime")
                }
            },
            CheckKind::Apdex => match self.fetcher.apdex(token).await {
                Ok(apdex) => apdex_content(&apdex),
                Err(err) => {
                    error!("can't get apdex info for token '{token}': {err}");
                    BadgeContent::unknown("apdex")
                }
            },
        };

        let svg = Bytes::from(
            Badge::new(content.label, &content.value, &content.color).render(self.style),
        );
        self.cache.set(key, svg.clone()).await;

        svg
    }
}

pub fn cache_key(token: &str, kind: CheckKind) -> String {
    format!("{token}:{}", kind.code())
}

pub fn status_content(status: &CheckStatus) -> BadgeContent {
    if status.is_down {
        BadgeContent::new("status", "down", COLOR_CRITICAL)
    } else {
        BadgeContent::new("status", "up", COLOR_SUCCESS)
    }
}

pub fn uptime_content(status: &CheckStatus) -> BadgeContent {
    if status.uptime >= 100.0 {
        return BadgeContent::new("uptime", "100%", ramp(1.0));
    }

    let ratio = normalize(status.uptime, UPTIME_FLOOR, UPTIME_SPAN);
    BadgeContent::new("uptime", format!("{:.2}%", status.uptime), ramp(ratio))
}

pub fn apdex_content(apdex: &CheckApdex) -> BadgeContent {
    if apdex.value > APDEX_CEILING {
        return BadgeContent::new("apdex", "1.0", ramp(1.0));
    }

    let ratio = normalize(apdex.value, APDEX_FLOOR, APDEX_SPAN);
    BadgeContent::new("apdex", format!("{:.2}", apdex.value), ramp(ratio))
}

/// Linear position of `value` inside `[floor, floor + span]`, clamped to `[0, 1]`.
fn normalize(value: f64, floor: f64, span: f64) -> f64 {
    ((value - floor) / span).clamp(0.0, 1.0)
}
