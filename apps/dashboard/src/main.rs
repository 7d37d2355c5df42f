mod api_client;
mod config;
mod errors;
mod hooks;
mod models;
mod pages;
mod query;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::hooks::{Hooks, HooksConfig};
use crate::query::{QueryClient, QueryOptions};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Margin Hunter dashboard v{}", env!("CARGO_PKG_VERSION"));

    let api = ApiClient::new(&config.api_base_url, config.http_timeout)?;
    info!("API client initialized (base: {})", api.base_url());

    let cache = QueryClient::new(config.query_gc);
    let hooks = Hooks::new(
        api,
        cache,
        HooksConfig {
            read: QueryOptions {
                retry: config.query_retries,
                retry_delay: config.query_retry_base,
                ..QueryOptions::default()
            },
            health_candidates: config.health_urls.clone(),
            ..HooksConfig::default()
        },
    );

    // Keeps the scraper status warm for as long as the server runs.
    let _scraper_poller = hooks.poll_scraper_status();

    let state = AppState {
        hooks,
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
