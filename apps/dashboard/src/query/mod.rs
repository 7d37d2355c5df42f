//! Keyed query cache behind every read the dashboard makes.
//!
//! Each entry holds the last good value, when it was fetched, how many
//! observers are attached, and the handle of the fetch currently running for
//! it. Concurrent reads of one key share a single fetch. Invalidation only
//! marks entries stale; the old value stays readable until the refetch lands.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

use crate::api_client::ApiError;

pub mod key;
pub mod poll;
pub mod state;

pub use key::QueryKey;
pub use poll::Poller;
pub use state::{MutationState, QueryError, QueryState};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

type Payload = Arc<dyn Any + Send + Sync>;
type Flight = Arc<OnceCell<Result<Payload, QueryError>>>;

/// Per-query read policy.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// How long a fetched value is served without refetching.
    pub stale_time: Duration,
    /// Extra attempts for transient failures. Reads only.
    pub retry: u32,
    /// First backoff step; doubles per attempt.
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl QueryOptions {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }
}

struct InFlight {
    cell: Flight,
    generation: u64,
}

struct Entry {
    data: Option<Payload>,
    fetched_at: Option<Instant>,
    fetched_wall: Option<DateTime<Utc>>,
    invalidated: bool,
    /// Bumped by every invalidation so a fetch that started earlier cannot
    /// mark its result fresh.
    generation: u64,
    observers: usize,
    touched_at: Instant,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn new(now: Instant) -> Self {
        Self {
            data: None,
            fetched_at: None,
            fetched_wall: None,
            invalidated: false,
            generation: 0,
            observers: 0,
            touched_at: now,
            in_flight: None,
        }
    }

    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        if self.invalidated || self.data.is_none() {
            return false;
        }
        self.fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }

    fn is_collectable(&self, now: Instant, gc_time: Duration) -> bool {
        self.observers == 0
            && self.in_flight.is_none()
            && now.saturating_duration_since(self.touched_at) >= gc_time
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    gc_time: Duration,
}

/// Shared handle to the cache. Cloning is cheap.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.lock().len())
            .field("gc_time", &self.inner.gc_time)
            .finish()
    }
}

impl QueryClient {
    /// `gc_time` is how long an entry nobody observes is kept after its last use.
    pub fn new(gc_time: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                gc_time,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads `key`, serving the cached value while fresh and otherwise
    /// fetching (or joining the fetch already running for the key).
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run(key, options, &fetcher, false).await
    }

    /// Like [`fetch`](Self::fetch) but ignores freshness.
    pub async fn refetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: &F,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run(key, options, fetcher, true).await
    }

    async fn run<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: &QueryOptions,
        fetcher: &F,
        force: bool,
    ) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let flight = {
            let mut entries = self.lock();
            let now = Instant::now();
            self.sweep(&mut entries, now);

            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
            entry.touched_at = now;

            if !force && entry.is_fresh(now, options.stale_time) {
                trace!("cache hit for {key}");
                return snapshot(key, entry);
            }

            // Never join a fetch that started before the latest invalidation.
            match &entry.in_flight {
                Some(in_flight) if in_flight.generation == entry.generation => {
                    trace!("joining in-flight fetch for {key}");
                    in_flight.cell.clone()
                }
                superseded => {
                    if superseded.is_some() {
                        debug!("superseding outdated fetch for {key}");
                    } else {
                        debug!("fetching {key}");
                    }
                    let cell = Flight::default();
                    entry.in_flight = Some(InFlight {
                        cell: cell.clone(),
                        generation: entry.generation,
                    });
                    cell
                }
            }
        };

        let result = flight
            .get_or_init(|| fetch_with_retry(key, options, fetcher))
            .await
            .clone();

        let mut entries = self.lock();
        let now = Instant::now();
        let wall = Utc::now();
        let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
        entry.touched_at = now;

        // A superseded flight still answers its own callers but is not stored.
        let owns_flight = entry
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| Arc::ptr_eq(&in_flight.cell, &flight));
        if owns_flight {
            let started = entry.in_flight.take().map_or(entry.generation, |f| f.generation);
            match &result {
                Ok(payload) => {
                    entry.data = Some(payload.clone());
                    entry.fetched_at = Some(now);
                    entry.fetched_wall = Some(wall);
                    entry.invalidated = entry.generation != started;
                }
                Err(error) => debug!("fetch of {key} failed: {error}"),
            }
        }

        match result {
            Ok(payload) => ready(key, payload, wall),
            Err(error) => QueryState::Failed {
                error,
                data: entry.data.clone().and_then(|d| d.downcast::<T>().ok()),
            },
        }
    }

    /// Marks every entry under `prefix` as needing a refetch. Values are kept
    /// so readers can still show them until the refetch completes.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.lock();
        let mut count = 0;
        for (_, entry) in entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
            entry.invalidated = true;
            entry.generation += 1;
            count += 1;
        }
        debug!("invalidated {count} entries under {prefix}");
        count
    }

    /// Last value stored for `key`, fresh or not.
    #[cfg(test)]
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.data.clone())
            .and_then(|data| data.downcast::<T>().ok())
    }

    #[cfg(test)]
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().contains_key(key)
    }

    #[cfg(test)]
    pub fn observers(&self, key: &QueryKey) -> usize {
        self.lock().get(key).map_or(0, |entry| entry.observers)
    }

    /// Registers an observer for `key`. The entry cannot be collected while
    /// any subscription is alive.
    pub fn subscribe(&self, key: &QueryKey) -> Subscription {
        let mut entries = self.lock();
        let now = Instant::now();
        let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
        entry.observers += 1;
        entry.touched_at = now;
        Subscription {
            client: self.clone(),
            key: key.clone(),
        }
    }

    /// Runs one mutation. Not deduplicated and never retried. On success every
    /// entry under each prefix in `invalidates` is marked stale.
    pub async fn mutate<T, Fut>(
        &self,
        state: &MutationState,
        invalidates: &[QueryKey],
        mutation: Fut,
    ) -> Result<T, QueryError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let _pending = state.begin();
        let value = mutation.await?;
        for prefix in invalidates {
            self.invalidate(prefix);
        }
        Ok(value)
    }

    /// Evicts entries nobody observes that outlived the GC window.
    #[cfg(test)]
    pub fn collect_garbage(&self) {
        let mut entries = self.lock();
        self.sweep(&mut entries, Instant::now());
    }

    fn sweep(&self, entries: &mut HashMap<QueryKey, Entry>, now: Instant) {
        let gc_time = self.inner.gc_time;
        entries.retain(|key, entry| {
            let keep = !entry.is_collectable(now, gc_time);
            if !keep {
                trace!("evicting {key}");
            }
            keep
        });
    }
}

fn snapshot<T: Send + Sync + 'static>(key: &QueryKey, entry: &Entry) -> QueryState<T> {
    match entry.data.clone() {
        Some(payload) => ready(key, payload, entry.fetched_wall.unwrap_or_else(Utc::now)),
        None => QueryState::Idle,
    }
}

fn ready<T: Send + Sync + 'static>(
    key: &QueryKey,
    payload: Payload,
    updated_at: DateTime<Utc>,
) -> QueryState<T> {
    match payload.downcast::<T>() {
        Ok(data) => QueryState::Ready { data, updated_at },
        Err(_) => QueryState::Failed {
            error: QueryError::new(format!("cached value for {key} has a different type")),
            data: None,
        },
    }
}

async fn fetch_with_retry<T, F, Fut>(
    key: &QueryKey,
    options: &QueryOptions,
    fetcher: &F,
) -> Result<Payload, QueryError>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(Arc::new(value) as Payload),
            Err(err) if err.is_transient() && attempt < options.retry => {
                let delay = retry_delay(options.retry_delay, attempt);
                warn!(
                    "fetch of {} failed ({}), retrying after {}ms...",
                    key,
                    err,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1 << attempt.min(16)).min(MAX_RETRY_DELAY)
}

/// Observer handle returned by [`QueryClient::subscribe`]. Dropping it
/// detaches the observer.
pub struct Subscription {
    client: QueryClient,
    key: QueryKey,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut entries = self.client.lock();
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.touched_at = Instant::now();
        }
    }
}
