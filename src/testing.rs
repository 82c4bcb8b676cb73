use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    error::FetchError,
    models::{CheckApdex, CheckStatus},
    updown::StatusFetcher,
};

/// In-memory fetcher that counts calls and records requested tokens. `None` answers fail with HTTP 404.
#[derive(Default)]
pub struct FakeFetcher {
    pub status: Option<CheckStatus>,
    pub apdex: Option<CheckApdex>,
    pub panics: bool,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_status(uptime: f64, is_down: bool) -> Self {
        Self {
            status: Some(CheckStatus { uptime, is_down }),
            ..Self::default()
        }
    }

    pub fn with_apdex(value: f64) -> Self {
        Self {
            apdex: Some(CheckApdex { value }),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    fn record(&self, token: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.to_string());
        if self.panics {
            panic!("fake fetcher exploded");
        }
    }
}

#[async_trait]
impl StatusFetcher for FakeFetcher {
    async fn status(&self, token: &str) -> Result<CheckStatus, FetchError> {
        self.record(token);
        self.status.ok_or(FetchError::Status(404))
    }

    async fn apdex(&self, token: &str) -> Result<CheckApdex, FetchError> {
        self.record(token);
        self.apdex.ok_or(FetchError::Status(404))
    }
}
