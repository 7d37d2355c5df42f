use std::fmt::Write as _;

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::offer::{
    Offer, OfferCreate, OfferId, OfferListFilters, OfferStatus, PriceHistory,
};
use crate::pages::{error_note, escape, format_margin, format_price, layout, non_empty, Nav};
use crate::query::QueryState;
use crate::state::AppState;

/// Filter form values plus the selected row, as they appear in the URL.
#[derive(Debug, Default, Deserialize)]
pub struct OffersParams {
    pub status: Option<String>,
    pub min_margin: Option<String>,
    pub product_id: Option<String>,
    pub selected: Option<OfferId>,
}

impl OffersParams {
    fn filters(&self) -> Result<OfferListFilters, AppError> {
        let status = non_empty(&self.status)
            .map(str::parse::<OfferStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        let min_margin = non_empty(&self.min_margin)
            .map(str::parse::<f64>)
            .transpose()
            .map_err(|e| AppError::BadRequest(format!("min_margin: {e}")))?;
        let product_id = non_empty(&self.product_id)
            .map(str::parse::<i64>)
            .transpose()
            .map_err(|e| AppError::BadRequest(format!("product_id: {e}")))?;

        Ok(OfferListFilters {
            status,
            product_id,
            min_margin,
        })
    }
}

/// Builds `/offers?...` for the current filters, optionally selecting a row.
fn offers_href(filters: &OfferListFilters, selected: Option<OfferId>) -> String {
    let mut params = Vec::new();
    if let Some(status) = filters.status {
        params.push(format!("status={status}"));
    }
    if let Some(product_id) = filters.product_id {
        params.push(format!("product_id={product_id}"));
    }
    if let Some(min_margin) = filters.min_margin {
        params.push(format!("min_margin={min_margin}"));
    }
    if let Some(id) = selected {
        params.push(format!("selected={id}"));
    }

    if params.is_empty() {
        "/offers".to_string()
    } else {
        format!("/offers?{}", params.join("&"))
    }
}

/// GET /offers
pub async fn offers_page(
    State(state): State<AppState>,
    Query(params): Query<OffersParams>,
) -> Result<Html<String>, AppError> {
    let filters = params.filters()?;
    let hooks = &state.hooks;
    let (offers, detail, history) = tokio::join!(
        hooks.offers(&filters),
        hooks.offer(params.selected),
        hooks.offer_history(params.selected)
    );

    let mut content = String::from(
        "<p>All offers found by the scraper, with filters and status controls.</p>",
    );
    content.push_str(&render_filter_form(&filters));

    if let Some(error) = offers.error() {
        content.push_str(&error_note("Could not load offers", error.message()));
    }

    match offers.data() {
        Some(list) if list.is_empty() => content.push_str("<p>No offers found.</p>"),
        Some(list) => {
            content.push_str("<div class=\"split\">");
            content.push_str(&render_table(list, &filters, params.selected));
            content.push_str(&render_detail(&detail, &history));
            content.push_str("</div>");
        }
        None => {}
    }
    content.push_str(ADD_OFFER_FORM);

    Ok(layout(Nav::Offers, "Offers", "", &content))
}

fn render_filter_form(filters: &OfferListFilters) -> String {
    let mut options = String::from("<option value=\"\">All</option>");
    for status in OfferStatus::ALL {
        let selected = if filters.status == Some(status) { " selected" } else { "" };
        let _ = write!(options, "<option value=\"{status}\"{selected}>{status}</option>");
    }
    let min_margin = filters.min_margin.map(|m| m.to_string()).unwrap_or_default();
    let product_id = filters.product_id.map(|p| p.to_string()).unwrap_or_default();

    format!(
        "<form method=\"get\" action=\"/offers\" style=\"margin: 1rem 0\">\
         <label>Status: <select name=\"status\">{options}</select></label> \
         <label>Min. margin (%): <input type=\"number\" step=\"any\" name=\"min_margin\" value=\"{min_margin}\" style=\"width: 6rem\"></label> \
         <label>Product id: <input type=\"number\" name=\"product_id\" value=\"{product_id}\" style=\"width: 5rem\"></label> \
         <button type=\"submit\">Filter</button></form>"
    )
}

fn render_table(offers: &[Offer], filters: &OfferListFilters, selected: Option<OfferId>) -> String {
    let return_to = escape(&offers_href(filters, selected));
    let mut rows = String::new();

    for offer in offers {
        let class = if Some(offer.id) == selected { " class=\"selected\"" } else { "" };
        let mut status_options = String::new();
        for status in OfferStatus::ALL {
            let chosen = if offer.status == status { " selected" } else { "" };
            let _ = write!(status_options, "<option value=\"{status}\"{chosen}>{status}</option>");
        }

        let _ = write!(
            rows,
            "<tr{class}>\
             <td><a href=\"{select_href}\">{title}</a></td>\
             <td>{price}</td>\
             <td>{margin}</td>\
             <td><form method=\"post\" action=\"/offers/{id}/status\">\
             <select name=\"status\" onchange=\"this.form.submit()\">{status_options}</select>\
             <input type=\"hidden\" name=\"return_to\" value=\"{return_to}\">\
             <noscript><button type=\"submit\">Set</button></noscript></form></td>\
             <td><a href=\"{url}\" target=\"_blank\" rel=\"noreferrer\">Open</a></td></tr>",
            id = offer.id,
            select_href = escape(&offers_href(filters, Some(offer.id))),
            title = escape(&offer.title),
            price = format_price(offer.price),
            margin = format_margin(offer.margin_percent),
            url = escape(&offer.url),
        );
    }

    format!(
        "<table><thead><tr><th>Title</th><th>Price</th><th>Margin %</th><th>Status</th><th>Link</th></tr></thead>\
         <tbody>{rows}</tbody></table>"
    )
}

fn render_detail(detail: &QueryState<Offer>, history: &QueryState<Vec<PriceHistory>>) -> String {
    let mut out = String::from("<aside class=\"card\">");

    if detail.is_idle() {
        out.push_str("<p>Select an offer to see details and price history.</p></aside>");
        return out;
    }

    if let Some(error) = detail.error() {
        out.push_str(&error_note("Could not load offer", error.message()));
    }
    if let Some(offer) = detail.data() {
        let _ = write!(out, "<h3>{}</h3>", escape(&offer.title));
        let _ = write!(out, "<p><strong>Price:</strong> {}</p>", format_price(offer.price));
        if let Some(reference) = offer.geizhals_price {
            let _ = write!(out, "<p><strong>Reference price:</strong> {}</p>", format_price(reference));
        }
        let _ = write!(out, "<p><strong>Margin:</strong> {}</p>", format_margin(offer.margin_percent));
        for (label, value) in [
            ("Seller", &offer.seller_name),
            ("Location", &offer.location),
            ("Description", &offer.description),
        ] {
            if let Some(value) = value {
                let _ = write!(out, "<p><strong>{label}:</strong> {}</p>", escape(value));
            }
        }
        let _ = write!(
            out,
            "<p><strong>First seen:</strong> {}</p><p><strong>Last checked:</strong> {}</p>",
            offer.first_seen_at.format("%Y-%m-%d %H:%M"),
            offer.last_checked_at.format("%Y-%m-%d %H:%M"),
        );
    }

    out.push_str("<h4>Price history</h4>");
    if let Some(error) = history.error() {
        out.push_str(&error_note("Could not load price history", error.message()));
    }
    match history.data() {
        Some(entries) if entries.is_empty() => out.push_str("<p>No price history yet.</p>"),
        Some(entries) => {
            out.push_str("<ul>");
            for entry in entries {
                let _ = write!(
                    out,
                    "<li>{}: {}</li>",
                    entry.recorded_at.format("%Y-%m-%d %H:%M"),
                    format_price(entry.price)
                );
            }
            out.push_str("</ul>");
        }
        None => {}
    }

    out.push_str("</aside>");
    out
}

const ADD_OFFER_FORM: &str = "<details style=\"margin-top: 1.5rem\"><summary>Add offer manually</summary>\
     <form method=\"post\" action=\"/offers\" class=\"card\">\
     <p><label>Product id <input type=\"number\" name=\"product_id\" required></label></p>\
     <p><label>Title <input name=\"title\" required></label></p>\
     <p><label>Price <input type=\"number\" step=\"any\" name=\"price\" required></label></p>\
     <p><label>URL <input name=\"url\" required></label></p>\
     <p><label>Seller <input name=\"seller_name\"></label></p>\
     <p><label>Location <input name=\"location\"></label></p>\
     <button type=\"submit\">Add</button></form></details>";

/// Manual offer entry as posted by the browser.
#[derive(Debug, Default, Deserialize)]
pub struct OfferForm {
    pub product_id: String,
    pub title: String,
    pub price: String,
    pub url: String,
    pub seller_name: Option<String>,
    pub location: Option<String>,
}

impl OfferForm {
    fn into_payload(self) -> Result<OfferCreate, AppError> {
        let product_id = self
            .product_id
            .trim()
            .parse::<i64>()
            .map_err(|e| AppError::BadRequest(format!("product_id: {e}")))?;
        let price = self
            .price
            .trim()
            .parse::<f64>()
            .map_err(|e| AppError::BadRequest(format!("price: {e}")))?;
        let title = self.title.trim().to_string();
        let url = self.url.trim().to_string();
        if title.is_empty() || url.is_empty() {
            return Err(AppError::BadRequest("title and url are required".to_string()));
        }

        Ok(OfferCreate {
            product_id,
            title,
            price,
            url,
            image_url: None,
            seller_name: non_empty(&self.seller_name).map(str::to_string),
            location: non_empty(&self.location).map(str::to_string),
            description: None,
            status: OfferStatus::New,
            margin_percent: None,
            geizhals_price: None,
        })
    }
}

/// POST /offers
pub async fn create_offer(
    State(state): State<AppState>,
    Form(form): Form<OfferForm>,
) -> Result<Redirect, AppError> {
    let payload = form.into_payload()?;
    let offer = state.hooks.create_offer(&payload).await?;
    Ok(Redirect::to(&format!("/offers?selected={}", offer.id)))
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    pub return_to: Option<String>,
}

/// POST /offers/:id/status
pub async fn update_offer_status(
    State(state): State<AppState>,
    Path(id): Path<OfferId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let status = form.status.parse::<OfferStatus>().map_err(AppError::BadRequest)?;
    state.hooks.update_offer_status(id, status).await?;

    // Only ever redirect back into the offers page.
    let target = form
        .return_to
        .filter(|path| path.starts_with("/offers"))
        .unwrap_or_else(|| "/offers".to_string());
    Ok(Redirect::to(&target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_form_values_mean_no_filter() {
        let params = OffersParams {
            status: Some(String::new()),
            min_margin: Some(" ".to_string()),
            product_id: None,
            selected: None,
        };
        assert_eq!(params.filters().unwrap(), OfferListFilters::default());
    }

    #[test]
    fn test_filters_parse() {
        let params = OffersParams {
            status: Some("open".to_string()),
            min_margin: Some("12.5".to_string()),
            product_id: Some("3".to_string()),
            selected: Some(9),
        };
        let filters = params.filters().unwrap();
        assert_eq!(filters.status, Some(OfferStatus::Open));
        assert_eq!(filters.min_margin, Some(12.5));
        assert_eq!(filters.product_id, Some(3));
    }

    #[test]
    fn test_invalid_filters_are_rejected() {
        let params = OffersParams {
            status: Some("sold".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.filters(), Err(AppError::BadRequest(_))));

        let params = OffersParams {
            min_margin: Some("lots".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.filters(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_offers_href_keeps_filters() {
        let filters = OfferListFilters {
            status: Some(OfferStatus::Open),
            min_margin: Some(7.5),
            ..Default::default()
        };
        assert_eq!(offers_href(&filters, Some(4)), "/offers?status=open&min_margin=7.5&selected=4");
        assert_eq!(offers_href(&OfferListFilters::default(), None), "/offers");
    }

    #[test]
    fn test_offer_form_builds_payload() {
        let form = OfferForm {
            product_id: "2".to_string(),
            title: " RTX 4070 Ventus ".to_string(),
            price: "399.9".to_string(),
            url: "https://example.com/a".to_string(),
            seller_name: Some(String::new()),
            location: Some("Hamburg".to_string()),
        };
        let payload = form.into_payload().unwrap();
        assert_eq!(payload.product_id, 2);
        assert_eq!(payload.title, "RTX 4070 Ventus");
        assert_eq!(payload.status, OfferStatus::New);
        assert_eq!(payload.seller_name, None);
        assert_eq!(payload.location.as_deref(), Some("Hamburg"));

        let bad = OfferForm {
            price: "cheap".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad.into_payload(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_detail_prompts_for_selection_when_idle() {
        let html = render_detail(&QueryState::Idle, &QueryState::Idle);
        assert!(html.contains("Select an offer"));
        assert!(!html.contains("Price history"));
    }
}
