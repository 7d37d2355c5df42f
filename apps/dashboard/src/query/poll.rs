use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::api_client::ApiError;
use crate::query::{QueryClient, QueryKey, QueryOptions};

/// Background refetch loop for one key. Holds an observer on the key for as
/// long as it runs; dropping the poller stops it.
#[derive(Debug)]
pub struct Poller {
    key: QueryKey,
    task: JoinHandle<()>,
}

impl Poller {
    #[cfg(test)]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        debug!("stopping poller for {}", self.key);
        self.task.abort();
    }
}

impl QueryClient {
    /// Refetches `key` immediately and then every `every`, whether or not
    /// anyone reads it in between.
    pub fn poll<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        every: Duration,
        fetcher: F,
    ) -> Poller
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let client = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let _observer = client.subscribe(&task_key);
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let state = client.refetch(&task_key, &options, &fetcher).await;
                if let Some(error) = state.error() {
                    debug!("poll of {task_key} failed: {error}");
                }
            }
        });
        Poller { key, task }
    }
}
