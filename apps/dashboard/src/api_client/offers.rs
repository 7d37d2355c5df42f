use reqwest::{Method, RequestBuilder};

use crate::api_client::{ApiClient, ApiError};
use crate::models::offer::{
    Offer, OfferCreate, OfferId, OfferListFilters, OfferStatus, OfferStatusUpdate, PriceHistory,
};

/// `/offers` resource.
#[derive(Debug, Clone, Copy)]
pub struct OffersApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn offers(&self) -> OffersApi<'_> {
        OffersApi { api: self }
    }
}

impl OffersApi<'_> {
    /// GET /offers with only the filters that are set.
    pub async fn list(self, filters: &OfferListFilters) -> Result<Vec<Offer>, ApiError> {
        self.api.send(self.list_request(filters)).await
    }

    pub(crate) fn list_request(&self, filters: &OfferListFilters) -> RequestBuilder {
        self.api.request(Method::GET, "/offers").query(filters)
    }

    /// GET /offers/{id}
    pub async fn get(self, id: OfferId) -> Result<Offer, ApiError> {
        self.api.get(&format!("/offers/{id}")).await
    }

    /// GET /offers/{id}/history
    pub async fn history(self, id: OfferId) -> Result<Vec<PriceHistory>, ApiError> {
        self.api.get(&format!("/offers/{id}/history")).await
    }

    /// POST /offers
    pub async fn create(self, payload: &OfferCreate) -> Result<Offer, ApiError> {
        self.api.post("/offers", payload).await
    }

    /// PUT /offers/{id}/status. Status is the only writable field.
    pub async fn update_status(self, id: OfferId, status: OfferStatus) -> Result<Offer, ApiError> {
        self.api
            .put(&format!("/offers/{id}/status"), &OfferStatusUpdate { status })
            .await
    }
}
