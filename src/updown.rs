use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    constants::{
        APP_NAME, UPDOWN_IDLE_TIMEOUT_SECS, UPDOWN_MAX_IDLE_PER_HOST, UPDOWN_TIMEOUT_SECS,
    },
    error::FetchError,
    models::{CheckApdex, CheckStatus},
};

/// Source of check data for the badge pipeline.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn status(&self, token: &str) -> Result<CheckStatus, FetchError>;
    async fn apdex(&self, token: &str) -> Result<CheckApdex, FetchError>;
}

#[derive(Clone)]
pub struct UpdownClient {
    http_client: reqwest::Client,
    api_url: Url,
    api_key: String,
}

impl UpdownClient {
    pub fn new(api_url: Url, api_key: String) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&user_agent()) {
            headers.insert(USER_AGENT, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(UPDOWN_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(UPDOWN_IDLE_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(UPDOWN_TIMEOUT_SECS))
            .timeout(Duration::from_secs(UPDOWN_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            api_url,
            api_key,
        })
    }

    fn check_url(&self, token: &str, metrics: bool) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(token);
            if metrics {
                segments.push("metrics");
            }
        }
        url.query_pairs_mut().append_pair("api-key", &self.api_key);
        url
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        url: Url,
        what: &'static str,
    ) -> Result<T, FetchError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { what, source })
    }
}

#[async_trait]
impl StatusFetcher for UpdownClient {
    async fn status(&self, token: &str) -> Result<CheckStatus, FetchError> {
        self.execute(self.check_url(token, false), "status").await
    }

    async fn apdex(&self, token: &str) -> Result<CheckApdex, FetchError> {
        self.execute(self.check_url(token, true), "apdex").await
    }
}

fn user_agent() -> String {
    format!(
        "{APP_NAME}/{} (rust; {}-{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS,
    )
}
