use std::time::Duration;

use axum::body::Bytes;
use moka::future::Cache;
use tokio::task::JoinHandle;
use tracing::debug;

/// Rendered badges keyed by `{token}:{kind}`. Entries expire `ttl` after they
/// were written; expired entries read as misses even before a sweep evicts them.
#[derive(Clone)]
pub struct BadgeCache {
    entries: Cache<String, Bytes>,
    sweep_interval: Duration,
}

impl BadgeCache {
    pub fn new(ttl: Duration, sweep_interval: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            entries,
            sweep_interval,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key).await
    }

    pub async fn set(&self, key: String, value: Bytes) {
        self.entries.insert(key, value).await;
    }

    /// Starts the periodic eviction sweep.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let entries = self.entries.clone();
        let period = self.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                entries.run_pending_tasks().await;
                debug!("badge cache swept, {} entries left", entries.entry_count());
            }
        })
    }
}
