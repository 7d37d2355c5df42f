use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::timestamp;

pub type ProductId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub brands: Vec<String>,
    /// Matching rules evaluated by the backend; opaque to the dashboard.
    #[serde(default)]
    pub filters: Map<String, Value>,
    pub price_min: f64,
    pub price_max: f64,
    pub active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub brands: Vec<String>,
    pub filters: Map<String, Value>,
    pub price_min: f64,
    pub price_max: f64,
    pub active: bool,
}

/// Partial update. Unset fields are not sent and stay untouched server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl From<ProductCreate> for ProductUpdate {
    fn from(full: ProductCreate) -> Self {
        ProductUpdate {
            name: Some(full.name),
            category: Some(full.category),
            brands: Some(full.brands),
            filters: Some(full.filters),
            price_min: Some(full.price_min),
            price_max: Some(full.price_max),
            active: Some(full.active),
        }
    }
}
