pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pages::{dashboard, offers, products, scraper};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health_handler))
        .route("/", get(dashboard::dashboard_page))
        // Offers
        .route("/offers", get(offers::offers_page).post(offers::create_offer))
        .route("/offers/:id/status", post(offers::update_offer_status))
        // Products
        .route(
            "/products",
            get(products::products_page).post(products::create_product),
        )
        .route("/products/:id", post(products::update_product))
        .route("/products/:id/delete", post(products::delete_product))
        // Scraper control
        .route("/scraper", get(scraper::scraper_page))
        .route("/scraper/start", post(scraper::start_scraper))
        .route("/scraper/stop", post(scraper::stop_scraper))
        .route("/scraper/run-once", post(scraper::run_scraper_once))
        .with_state(state)
}
