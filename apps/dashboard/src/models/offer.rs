use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp;

pub type OfferId = i64;

/// Workflow state of a scraped offer. The only field the dashboard writes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    New,
    Open,
    Ignored,
    Contacted,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 4] = [
        OfferStatus::New,
        OfferStatus::Open,
        OfferStatus::Ignored,
        OfferStatus::Contacted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OfferStatus::New => "new",
            OfferStatus::Open => "open",
            OfferStatus::Ignored => "ignored",
            OfferStatus::Contacted => "contacted",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OfferStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown offer status '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub product_id: i64,
    pub title: String,
    pub price: f64,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: OfferStatus,
    #[serde(default)]
    pub margin_percent: Option<f64>,
    /// Reference price the margin is computed against.
    #[serde(default)]
    pub geizhals_price: Option<f64>,
    #[serde(with = "timestamp")]
    pub first_seen_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub last_checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferCreate {
    pub product_id: i64,
    pub title: String,
    pub price: f64,
    pub url: String,
    pub image_url: Option<String>,
    pub seller_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub status: OfferStatus,
    pub margin_percent: Option<f64>,
    pub geizhals_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferStatusUpdate {
    pub status: OfferStatus,
}

/// One observed price of an offer. Ordering is whatever the backend returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceHistory {
    pub id: i64,
    pub offer_id: OfferId,
    pub price: f64,
    #[serde(with = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

/// Optional list filters. Unset filters are left out of the query string
/// entirely, never sent as empty values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OfferListFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OfferStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_margin: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offer_decodes_backend_payload() {
        let offer: Offer = serde_json::from_value(json!({
            "id": 7,
            "product_id": 2,
            "title": "RTX 4070",
            "price": 420.0,
            "url": "https://example.com/7",
            "image_url": null,
            "status": "open",
            "margin_percent": 12.5,
            "geizhals_price": 480.0,
            "first_seen_at": "2024-05-01T10:00:00",
            "last_checked_at": "2024-05-02T10:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(offer.status, OfferStatus::Open);
        assert_eq!(offer.seller_name, None);
        assert_eq!(offer.margin_percent, Some(12.5));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_value::<OfferStatusUpdate>(json!({ "status": "sold" }));
        assert!(result.is_err());
        assert!("sold".parse::<OfferStatus>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in OfferStatus::ALL {
            assert_eq!(status.as_str().parse::<OfferStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_empty_filters_serialize_to_empty_object() {
        let value = serde_json::to_value(OfferListFilters::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_create_defaults_status_to_new() {
        let payload: OfferCreate = serde_json::from_value(json!({
            "product_id": 1,
            "title": "Steam Deck",
            "price": 300.0,
            "url": "https://example.com/deck",
            "image_url": null,
            "seller_name": null,
            "location": null,
            "description": null,
            "margin_percent": null,
            "geizhals_price": null
        }))
        .unwrap();
        assert_eq!(payload.status, OfferStatus::New);
    }
}
