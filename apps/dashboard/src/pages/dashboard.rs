use std::fmt::Write as _;

use axum::{extract::State, response::Html};

use crate::models::system::HealthStatus;
use crate::pages::{error_note, escape, layout, updated_note, Nav};
use crate::query::QueryState;
use crate::state::AppState;

/// GET /
pub async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    let health = state.hooks.health().await;
    layout(Nav::Dashboard, "Dashboard", "", &render_health(&health))
}

fn render_health(health: &QueryState<HealthStatus>) -> String {
    let mut out = String::from("<p>System status of the Margin Hunter backend.</p>");

    if let Some(error) = health.error() {
        out.push_str(&error_note("Could not load health status", error.message()));
    }

    match health.data() {
        Some(data) => {
            out.push_str("<div class=\"card\">");
            let _ = write!(out, "<p><strong>Status:</strong> {}</p>", escape(&data.status));
            if let Some(timestamp) = &data.timestamp {
                let _ = write!(out, "<p><strong>Checked:</strong> {}</p>", escape(timestamp));
            }
            if let Some(services) = &data.services {
                for (label, value) in [
                    ("Database", &services.database),
                    ("Cache", &services.cache),
                    ("Task queue", &services.task_queue),
                ] {
                    if let Some(value) = value {
                        let _ = write!(out, "<p><strong>{label}:</strong> {}</p>", escape(value));
                    }
                }
            }
            out.push_str(&updated_note(health));
            out.push_str("</div>");
        }
        None if health.error().is_none() => {
            out.push_str("<p>No health data available. Is the backend running?</p>");
        }
        None => {}
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::system::ServiceStatuses;
    use crate::query::QueryError;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_renders_dependency_detail() {
        let state = QueryState::Ready {
            data: Arc::new(HealthStatus {
                status: "ok".to_string(),
                timestamp: None,
                services: Some(ServiceStatuses {
                    database: Some("ok".to_string()),
                    cache: None,
                    task_queue: Some("down".to_string()),
                }),
            }),
            updated_at: Utc::now(),
        };
        let html = render_health(&state);
        assert!(html.contains("<strong>Status:</strong> ok"));
        assert!(html.contains("<strong>Database:</strong> ok"));
        assert!(html.contains("<strong>Task queue:</strong> down"));
        assert!(!html.contains("Cache:"));
        assert!(html.contains("class=\"muted\">Updated "));
    }

    #[test]
    fn test_renders_error_state() {
        let state: QueryState<HealthStatus> = QueryState::Failed {
            error: QueryError::new("Request failed (502): Bad Gateway"),
            data: None,
        };
        let html = render_health(&state);
        assert!(html.contains("Could not load health status: Request failed (502): Bad Gateway"));
        assert!(!html.contains("No health data"));
    }

    #[test]
    fn test_renders_empty_state() {
        let html = render_health(&QueryState::Idle);
        assert!(html.contains("No health data available"));
    }
}
