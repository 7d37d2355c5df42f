use std::fmt::Write as _;

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::product::{Product, ProductCreate, ProductId, ProductUpdate};
use crate::pages::{error_note, escape, format_price, layout, Nav};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsParams {
    pub edit: Option<ProductId>,
}

/// Create/edit form as posted by the browser.
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    /// Comma separated, order preserved.
    #[serde(default)]
    pub brands: String,
    /// JSON object; empty means no filters.
    #[serde(default)]
    pub filters: String,
    pub price_min: String,
    pub price_max: String,
    /// Checkbox: present when ticked.
    pub active: Option<String>,
}

impl ProductForm {
    fn into_payload(self) -> Result<ProductCreate, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be empty".to_string()));
        }
        let filters = match self.filters.trim() {
            "" => Map::new(),
            raw => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(AppError::BadRequest(
                        "filters must be a JSON object".to_string(),
                    ))
                }
                Err(e) => return Err(AppError::BadRequest(format!("filters: {e}"))),
            },
        };

        Ok(ProductCreate {
            name,
            category: self.category.trim().to_string(),
            brands: self
                .brands
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .collect(),
            filters,
            price_min: parse_price("price_min", &self.price_min)?,
            price_max: parse_price("price_max", &self.price_max)?,
            active: self.active.is_some(),
        })
    }
}

fn parse_price(field: &str, raw: &str) -> Result<f64, AppError> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "0" } else { raw };
    raw.parse::<f64>()
        .map_err(|e| AppError::BadRequest(format!("{field}: {e}")))
}

/// GET /products
pub async fn products_page(
    State(state): State<AppState>,
    Query(params): Query<ProductsParams>,
) -> Html<String> {
    let products = state.hooks.products().await;

    let mut content = String::from("<p>Tracked products used to match incoming offers.</p>");
    if let Some(error) = products.error() {
        content.push_str(&error_note("Could not load products", error.message()));
    }

    let editing = params
        .edit
        .and_then(|id| products.data().and_then(|list| list.iter().find(|p| p.id == id)));

    match products.data() {
        Some(list) if list.is_empty() => content.push_str("<p>No products yet.</p>"),
        Some(list) => content.push_str(&render_table(list, params.edit)),
        None => {}
    }
    content.push_str(&render_form(editing));

    layout(Nav::Products, "Products", "", &content)
}

fn render_table(products: &[Product], editing: Option<ProductId>) -> String {
    let mut rows = String::new();
    for product in products {
        let class = if Some(product.id) == editing { " class=\"selected\"" } else { "" };
        let _ = write!(
            rows,
            "<tr{class}><td>{name}</td><td>{category}</td><td>{brands}</td>\
             <td>{min} - {max}</td><td>{active}</td>\
             <td><a href=\"/products?edit={id}\">Edit</a> \
             <form method=\"post\" action=\"/products/{id}/delete\" style=\"display:inline\">\
             <button type=\"submit\">Delete</button></form></td></tr>",
            id = product.id,
            name = escape(&product.name),
            category = escape(&product.category),
            brands = escape(&product.brands.join(", ")),
            min = format_price(product.price_min),
            max = format_price(product.price_max),
            active = if product.active { "yes" } else { "no" },
        );
    }

    format!(
        "<table><thead><tr><th>Name</th><th>Category</th><th>Brands</th><th>Price range</th>\
         <th>Active</th><th></th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

/// Empty create form, or the edit form pre-filled from `editing`.
fn render_form(editing: Option<&Product>) -> String {
    let (heading, action, submit) = match editing {
        Some(product) => (
            format!("Edit {}", escape(&product.name)),
            format!("/products/{}", product.id),
            "Save",
        ),
        None => ("New product".to_string(), "/products".to_string(), "Create"),
    };
    let value = |f: fn(&Product) -> String| editing.map(f).map(|v| escape(&v)).unwrap_or_default();

    let name = value(|p| p.name.clone());
    let category = value(|p| p.category.clone());
    let brands = value(|p| p.brands.join(", "));
    let filters = value(|p| {
        if p.filters.is_empty() {
            String::new()
        } else {
            Value::Object(p.filters.clone()).to_string()
        }
    });
    let price_min = value(|p| p.price_min.to_string());
    let price_max = value(|p| p.price_max.to_string());
    let checked = if editing.map_or(true, |p| p.active) { " checked" } else { "" };
    let cancel = if editing.is_some() {
        " <a href=\"/products\">Cancel</a>"
    } else {
        ""
    };

    format!(
        "<h3>{heading}</h3><form method=\"post\" action=\"{action}\" class=\"card\">\
         <p><label>Name <input name=\"name\" value=\"{name}\" required></label></p>\
         <p><label>Category <input name=\"category\" value=\"{category}\"></label></p>\
         <p><label>Brands <input name=\"brands\" value=\"{brands}\" placeholder=\"MSI, ASUS\"></label></p>\
         <p><label>Filters (JSON) <input name=\"filters\" value=\"{filters}\" placeholder='{{\"vram_gb\": 12}}'></label></p>\
         <p><label>Min price <input type=\"number\" step=\"any\" name=\"price_min\" value=\"{price_min}\"></label></p>\
         <p><label>Max price <input type=\"number\" step=\"any\" name=\"price_max\" value=\"{price_max}\"></label></p>\
         <p><label><input type=\"checkbox\" name=\"active\"{checked}> Active</label></p>\
         <button type=\"submit\">{submit}</button>{cancel}</form>"
    )
}

/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let payload = form.into_payload()?;
    state.hooks.create_product(&payload).await?;
    Ok(Redirect::to("/products"))
}

/// POST /products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let payload = ProductUpdate::from(form.into_payload()?);
    state.hooks.update_product(id, &payload).await?;
    Ok(Redirect::to("/products"))
}

/// POST /products/:id/delete
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    state.hooks.delete_product(id).await?;
    Ok(Redirect::to("/products"))
}
