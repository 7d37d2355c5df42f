use std::fmt::Write as _;

use axum::{extract::State, response::Html};

use crate::hooks::{Mutations, SCRAPER_POLL_INTERVAL};
use crate::models::system::{CommandAck, ScraperStatus};
use crate::pages::{error_note, escape, layout, updated_note, Nav};
use crate::query::{QueryError, QueryState};
use crate::state::AppState;

/// GET /scraper
pub async fn scraper_page(State(state): State<AppState>) -> Html<String> {
    render_page(&state, None).await
}

/// POST /scraper/start
pub async fn start_scraper(State(state): State<AppState>) -> Html<String> {
    let outcome = state.hooks.start_scraper().await;
    render_page(&state, Some(("Start", outcome))).await
}

/// POST /scraper/stop
pub async fn stop_scraper(State(state): State<AppState>) -> Html<String> {
    let outcome = state.hooks.stop_scraper().await;
    render_page(&state, Some(("Stop", outcome))).await
}

/// POST /scraper/run-once
pub async fn run_scraper_once(State(state): State<AppState>) -> Html<String> {
    let outcome = state.hooks.run_scraper_once().await;
    render_page(&state, Some(("Run once", outcome))).await
}

type Outcome = (&'static str, Result<CommandAck, QueryError>);

async fn render_page(state: &AppState, outcome: Option<Outcome>) -> Html<String> {
    let status = state.hooks.scraper_status().await;
    let refresh = format!(
        "<meta http-equiv=\"refresh\" content=\"{}; url=/scraper\">",
        SCRAPER_POLL_INTERVAL.as_secs()
    );

    let mut content = String::new();
    if let Some((command, result)) = &outcome {
        content.push_str(&render_outcome(command, result));
    }
    content.push_str(&render_status(&status));
    content.push_str(&render_controls(state.hooks.mutations()));

    layout(Nav::Scraper, "Scraper", &refresh, &content)
}

fn render_outcome(command: &str, result: &Result<CommandAck, QueryError>) -> String {
    match result {
        Ok(ack) => format!("<p class=\"notice\">{}</p>", escape(&ack.detail)),
        Err(error) => error_note(&format!("{command} failed"), error.message()),
    }
}

fn render_status(status: &QueryState<ScraperStatus>) -> String {
    let mut out = String::new();
    if let Some(error) = status.error() {
        out.push_str(&error_note("Could not load scraper status", error.message()));
    }

    match status.data() {
        Some(data) => {
            out.push_str("<div class=\"card\">");
            let _ = write!(out, "<p><strong>Status:</strong> {}</p>", escape(&data.status));
            if let Some(detail) = &data.detail {
                let _ = write!(out, "<p>{}</p>", escape(detail));
            }
            match data.last_run_at {
                Some(at) => {
                    let _ = write!(
                        out,
                        "<p><strong>Last run:</strong> {}</p>",
                        at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                None => out.push_str("<p><strong>Last run:</strong> never</p>"),
            }
            if let Some(last_error) = &data.last_error {
                out.push_str(&error_note("Last error", last_error));
            }
            out.push_str(&updated_note(status));
            out.push_str("</div>");
        }
        None if status.error().is_none() => out.push_str("<p>Scraper status unknown.</p>"),
        None => {}
    }
    out
}

/// Each button is disabled while its own command is in flight.
fn render_controls(mutations: &Mutations) -> String {
    let mut out = String::from("<p>");
    for (action, label, pending) in [
        ("/scraper/start", "Start", mutations.start_scraper.is_pending()),
        ("/scraper/stop", "Stop", mutations.stop_scraper.is_pending()),
        ("/scraper/run-once", "Run once", mutations.run_scraper_once.is_pending()),
    ] {
        let disabled = if pending { " disabled" } else { "" };
        let _ = write!(
            out,
            "<form method=\"post\" action=\"{action}\" style=\"display:inline\">\
             <button type=\"submit\"{disabled}>{label}</button></form> "
        );
    }
    out.push_str("</p>");
    out
}
