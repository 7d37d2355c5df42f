use crate::hooks::{keys, Hooks};
use crate::models::system::{CommandAck, HealthStatus, ScraperStatus};
use crate::query::{Poller, QueryError, QueryState};

impl Hooks {
    /// Backend health, served from cache for the health stale window.
    pub async fn health(&self) -> QueryState<HealthStatus> {
        let options = self
            .config
            .read
            .clone()
            .with_stale_time(self.config.health_stale_time);
        let api = &self.api;
        let candidates = &self.config.health_candidates;
        self.cache
            .fetch(&keys::health(), &options, || api.system().health(candidates))
            .await
    }

    /// Scraper status as last seen by the poller (or fetched now if the
    /// poller has not produced a value within one interval).
    pub async fn scraper_status(&self) -> QueryState<ScraperStatus> {
        let options = self
            .config
            .read
            .clone()
            .with_stale_time(self.config.scraper_poll_interval);
        let api = &self.api;
        self.cache
            .fetch(&keys::scraper_status(), &options, || api.system().scraper_status())
            .await
    }

    /// Keeps the scraper status entry refreshed every poll interval until
    /// the returned handle is dropped.
    pub fn poll_scraper_status(&self) -> Poller {
        let api = self.api.clone();
        self.cache.poll(
            keys::scraper_status(),
            self.config.read.clone(),
            self.config.scraper_poll_interval,
            move || {
                let api = api.clone();
                async move { api.system().scraper_status().await }
            },
        )
    }

    pub async fn start_scraper(&self) -> Result<CommandAck, QueryError> {
        self.cache
            .mutate(
                &self.mutations.start_scraper,
                &[keys::scraper_status()],
                self.api.system().start_scraper(),
            )
            .await
    }

    pub async fn stop_scraper(&self) -> Result<CommandAck, QueryError> {
        self.cache
            .mutate(
                &self.mutations.stop_scraper,
                &[keys::scraper_status()],
                self.api.system().stop_scraper(),
            )
            .await
    }

    /// One scrape pass. New offers may appear, so the offer family is
    /// refreshed as well.
    pub async fn run_scraper_once(&self) -> Result<CommandAck, QueryError> {
        self.cache
            .mutate(
                &self.mutations.run_scraper_once,
                &[keys::scraper_status(), keys::offers()],
                self.api.system().run_scraper_once(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::ApiClient;
    use crate::hooks::HooksConfig;
    use crate::query::{QueryClient, QueryOptions};
    use crate::test_support::{spawn_backend, test_hooks};
    use std::time::Duration;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    fn system_routes() -> Router {
        Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(json!({
                        "status": "ok",
                        "timestamp": "2024-05-01T10:00:00Z",
                        "services": { "database": "ok", "redis": "ok", "celery": "ok" }
                    }))
                }),
            )
            .route("/scraper/status", get(|| async { Json(json!({ "status": "idle" })) }))
            .route(
                "/scraper/start",
                post(|| async { (StatusCode::ACCEPTED, Json(json!({ "detail": "started" }))) }),
            )
            .route(
                "/scraper/stop",
                post(|| async { (StatusCode::ACCEPTED, Json(json!({ "detail": "stopped" }))) }),
            )
            .route("/products", get(|| async { Json(json!([])) }))
    }

    #[tokio::test]
    async fn test_health_is_cached_within_window() {
        let (base_url, log) = spawn_backend(system_routes()).await;
        let hooks = test_hooks(&base_url);

        let first = hooks.health().await;
        let second = hooks.health().await;
        assert_eq!(first.data().map(|h| h.status.as_str()), Some("ok"));
        assert!(second.data().is_some());
        assert_eq!(log.count("GET /api/health"), 1);
    }

    #[tokio::test]
    async fn test_health_survives_dead_candidate() {
        let (base_url, log) = spawn_backend(system_routes()).await;
        let api = ApiClient::new(base_url.as_str(), Duration::from_secs(5)).unwrap();
        let hooks = Hooks::new(
            api,
            QueryClient::new(Duration::from_secs(300)),
            HooksConfig {
                read: QueryOptions {
                    retry: 0,
                    ..QueryOptions::default()
                },
                health_candidates: vec![format!("{base_url}/down")],
                ..HooksConfig::default()
            },
        );

        let health = hooks.health().await;
        assert!(health.error().is_none());
        assert_eq!(health.data().map(|h| h.status.as_str()), Some("ok"));
        assert_eq!(log.entries(), vec!["GET /api/down", "GET /api/health"]);
    }

    #[tokio::test]
    async fn test_scraper_commands_invalidate_status_only() {
        let (base_url, log) = spawn_backend(system_routes()).await;
        let hooks = test_hooks(&base_url);

        hooks.scraper_status().await;
        hooks.products().await;

        let ack = hooks.start_scraper().await.unwrap();
        assert_eq!(ack.detail, "started");
        hooks.scraper_status().await;
        hooks.products().await;

        hooks.stop_scraper().await.unwrap();
        hooks.scraper_status().await;

        assert_eq!(log.count("GET /api/scraper/status"), 3);
        assert_eq!(log.count("GET /api/products"), 1);
    }

    #[tokio::test]
    async fn test_poller_keeps_status_warm() {
        let (base_url, log) = spawn_backend(system_routes()).await;
        let hooks = test_hooks(&base_url);

        let poller = hooks.poll_scraper_status();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(poller.key(), &keys::scraper_status());

        // The first tick already filled the entry, so this read is a hit.
        let status = hooks.scraper_status().await;
        assert_eq!(status.data().map(|s| s.status.as_str()), Some("idle"));
        assert_eq!(log.count("GET /api/scraper/status"), 1);
    }
}
