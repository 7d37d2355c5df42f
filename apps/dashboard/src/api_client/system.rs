use crate::api_client::{ApiClient, ApiError};
use crate::models::system::{CommandAck, HealthStatus, ScraperStatus};

/// Health and scraper control endpoints.
#[derive(Debug, Clone, Copy)]
pub struct SystemApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn system(&self) -> SystemApi<'_> {
        SystemApi { api: self }
    }
}

impl SystemApi<'_> {
    /// Tries each configured health URL in order, then GET /health on the
    /// API root.
    pub async fn health(self, candidates: &[String]) -> Result<HealthStatus, ApiError> {
        let mut urls = candidates.to_vec();
        urls.push(format!("{}/health", self.api.base_url()));
        self.api.get_first_available(&urls).await
    }

    /// GET /scraper/status
    pub async fn scraper_status(self) -> Result<ScraperStatus, ApiError> {
        self.api.get("/scraper/status").await
    }

    /// POST /scraper/start
    pub async fn start_scraper(self) -> Result<CommandAck, ApiError> {
        self.api.post_empty("/scraper/start").await
    }

    /// POST /scraper/stop
    pub async fn stop_scraper(self) -> Result<CommandAck, ApiError> {
        self.api.post_empty("/scraper/stop").await
    }

    /// POST /scraper/run-once. Runs a single synchronous scrape pass.
    pub async fn run_scraper_once(self) -> Result<CommandAck, ApiError> {
        self.api.post_empty("/scraper/run-once").await
    }
}
