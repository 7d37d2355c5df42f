//! Server-rendered dashboard pages. Pages only read hook output and
//! dispatch mutations; they never touch the cache directly.

use std::fmt::Write as _;

use axum::response::Html;

use crate::query::QueryState;

pub mod dashboard;
pub mod offers;
pub mod products;
pub mod scraper;

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; background: #0f172a; color: #e5e7eb; }
.app { display: grid; grid-template-columns: 12rem 1fr; min-height: 100vh; }
.sidebar { background: #020617; padding: 1rem; border-right: 1px solid #1f2937; }
.logo { font-weight: 700; margin-bottom: 1.5rem; }
.sidebar a { display: block; color: #9ca3af; padding: 0.35rem 0; text-decoration: none; }
.sidebar a.active { color: #f9fafb; font-weight: 600; }
header { padding: 1rem 1.5rem; border-bottom: 1px solid #1f2937; font-size: 1.1rem; }
main { padding: 1.5rem; }
table { border-collapse: collapse; min-width: 60%; }
th, td { border-bottom: 1px solid #1f2937; padding: 0.5rem; text-align: left; }
tr.selected { background: #111827; }
.card { padding: 1rem; border-radius: 0.5rem; border: 1px solid #1f2937; background: #020617; max-width: 24rem; }
.error { color: salmon; }
.notice { color: #86efac; }
.muted { color: #6b7280; font-size: 0.85rem; }
.split { display: flex; gap: 1.5rem; align-items: flex-start; }
a { color: #93c5fd; }
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Offers,
    Products,
    Scraper,
}

impl Nav {
    const ALL: [(Nav, &'static str, &'static str); 4] = [
        (Nav::Dashboard, "/", "Dashboard"),
        (Nav::Offers, "/offers", "Offers"),
        (Nav::Products, "/products", "Products"),
        (Nav::Scraper, "/scraper", "Scraper"),
    ];
}

/// Wraps page content in the routed shell (sidebar navigation + header).
pub fn layout(active: Nav, title: &str, head_extra: &str, content: &str) -> Html<String> {
    let mut nav = String::new();
    for (item, href, label) in Nav::ALL {
        let class = if item == active { " class=\"active\"" } else { "" };
        let _ = write!(nav, "<a href=\"{href}\"{class}>{label}</a>");
    }

    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title} | Margin Hunter</title>{head_extra}<style>{STYLE}</style></head>\
         <body><div class=\"app\"><aside class=\"sidebar\"><div class=\"logo\">Margin Hunter</div>\
         <nav>{nav}</nav></aside><div><header>Margin Hunter - Arbitrage Dashboard</header>\
         <main><section><h2>{title}</h2>{content}</section></main></div></div></body></html>",
        title = escape(title),
    ))
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn error_note(context: &str, message: &str) -> String {
    format!(
        "<p class=\"error\">{}: {}</p>",
        escape(context),
        escape(message)
    )
}

pub fn format_price(price: f64) -> String {
    format!("{price:.2} €")
}

pub fn format_margin(margin: Option<f64>) -> String {
    margin.map_or_else(|| "-".to_string(), |m| format!("{m:.1} %"))
}

/// "Updated hh:mm:ss" line for a card, empty unless the read succeeded.
pub fn updated_note<T>(state: &QueryState<T>) -> String {
    state
        .updated_at()
        .map(|at| format!("<p class=\"muted\">Updated {}</p>", at.format("%H:%M:%S")))
        .unwrap_or_default()
}

/// Form inputs arrive as strings; an empty value means "not set".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updated_note_only_for_ready_state() {
        use chrono::{TimeZone, Utc};
        use std::sync::Arc;

        let ready = QueryState::Ready {
            data: Arc::new(1),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 7).unwrap(),
        };
        assert_eq!(updated_note(&ready), "<p class=\"muted\">Updated 09:05:07</p>");
        assert_eq!(updated_note::<i32>(&QueryState::Idle), "");
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_layout_marks_active_nav() {
        let Html(page) = layout(Nav::Offers, "Offers", "", "<p>x</p>");
        assert!(page.contains("<a href=\"/offers\" class=\"active\">Offers</a>"));
        assert!(page.contains("<a href=\"/products\">Products</a>"));
        assert!(page.contains("<title>Offers | Margin Hunter</title>"));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_price(420.0), "420.00 €");
        assert_eq!(format_margin(Some(12.345)), "12.3 %");
        assert_eq!(format_margin(None), "-");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some(" open ".to_string())), Some("open"));
        assert_eq!(non_empty(&None), None);
    }
}
