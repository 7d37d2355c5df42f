use tracing::trace;

use crate::hooks::{keys, Hooks};
use crate::models::offer::{
    Offer, OfferCreate, OfferId, OfferListFilters, OfferStatus, PriceHistory,
};
use crate::query::{QueryError, QueryState};

impl Hooks {
    pub async fn offers(&self, filters: &OfferListFilters) -> QueryState<Vec<Offer>> {
        let api = &self.api;
        self.cache
            .fetch(&keys::offer_list(filters), &self.config.read, || {
                api.offers().list(filters)
            })
            .await
    }

    /// Offer detail. Stays [`QueryState::Idle`] without touching the network
    /// until an id is selected.
    pub async fn offer(&self, id: Option<OfferId>) -> QueryState<Offer> {
        let Some(id) = id else {
            trace!("offer detail disabled: no id");
            return QueryState::Idle;
        };
        let api = &self.api;
        self.cache
            .fetch(&keys::offer(Some(id)), &self.config.read, || api.offers().get(id))
            .await
    }

    pub async fn offer_history(&self, id: Option<OfferId>) -> QueryState<Vec<PriceHistory>> {
        let Some(id) = id else {
            trace!("offer history disabled: no id");
            return QueryState::Idle;
        };
        let api = &self.api;
        self.cache
            .fetch(&keys::offer_history(Some(id)), &self.config.read, || {
                api.offers().history(id)
            })
            .await
    }

    pub async fn create_offer(&self, payload: &OfferCreate) -> Result<Offer, QueryError> {
        self.cache
            .mutate(
                &self.mutations.create_offer,
                &[keys::offers()],
                self.api.offers().create(payload),
            )
            .await
    }

    pub async fn update_offer_status(
        &self,
        id: OfferId,
        status: OfferStatus,
    ) -> Result<Offer, QueryError> {
        self.cache
            .mutate(
                &self.mutations.update_offer_status,
                &[keys::offers()],
                self.api.offers().update_status(id, status),
            )
            .await
    }
}
