//! In-process mock backend used by the test suites.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::hooks::{Hooks, HooksConfig};
use crate::query::{QueryClient, QueryOptions};
use crate::state::AppState;

/// Every request the mock backend saw, as `"<METHOD> <path>[?query]"`.
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<String>>>);

impl RequestLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|l| *l == line).count()
    }
}

async fn record(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    let line = match request.uri().query() {
        Some(query) => format!("{} {}?{}", request.method(), request.uri().path(), query),
        None => format!("{} {}", request.method(), request.uri().path()),
    };
    log.0.lock().unwrap().push(line);
    next.run(request).await
}

/// Serves `routes` under `/api` on an ephemeral port and returns the API root.
pub async fn spawn_backend(routes: Router) -> (String, RequestLog) {
    let log = RequestLog::default();
    let app = Router::new()
        .nest("/api", routes)
        .layer(middleware::from_fn_with_state(log.clone(), record));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api"), log)
}

pub fn offer_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "product_id": 1,
        "title": format!("Offer {id}"),
        "price": 100.0 + id as f64,
        "url": format!("https://example.com/offers/{id}"),
        "seller_name": "Seller",
        "location": "Berlin",
        "status": status,
        "margin_percent": 12.5,
        "geizhals_price": 140.0,
        "first_seen_at": "2024-05-01T10:00:00",
        "last_checked_at": "2024-05-01T12:00:00+00:00"
    })
}

pub fn product_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "category": "gpu",
        "brands": ["MSI"],
        "filters": {},
        "price_min": 100.0,
        "price_max": 500.0,
        "active": true,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

/// Hooks against `base_url` with a long stale time and no retries, so tests
/// observe exactly one request per cache miss.
pub fn test_hooks(base_url: &str) -> Hooks {
    let api = ApiClient::new(base_url, Duration::from_secs(5)).unwrap();
    let config = HooksConfig {
        read: QueryOptions {
            stale_time: Duration::from_secs(60),
            retry: 0,
            retry_delay: Duration::from_millis(1),
        },
        ..Default::default()
    };
    Hooks::new(api, QueryClient::new(Duration::from_secs(300)), config)
}

/// Page state over [`test_hooks`].
pub fn test_state(base_url: &str) -> AppState {
    AppState {
        hooks: test_hooks(base_url),
        config: Config {
            api_base_url: base_url.to_string(),
            health_urls: Vec::new(),
            port: 0,
            rust_log: "info".to_string(),
            http_timeout: Duration::from_secs(5),
            query_retries: 0,
            query_retry_base: Duration::from_millis(1),
            query_gc: Duration::from_secs(300),
        },
    }
}
