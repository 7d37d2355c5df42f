//! Typed reads and writes used by the pages.
//!
//! Every read goes through the shared [`QueryClient`] under a key from
//! [`keys`]; every write invalidates exactly its own resource family.

use std::sync::Arc;
use std::time::Duration;

use crate::api_client::ApiClient;
use crate::query::{MutationState, QueryClient, QueryOptions};

pub mod offers;
pub mod products;
pub mod system;

pub const HEALTH_STALE_TIME: Duration = Duration::from_secs(30);
pub const SCRAPER_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Cache keys, one family per backend resource.
pub mod keys {
    use crate::models::offer::{OfferId, OfferListFilters};
    use crate::query::QueryKey;

    pub fn offers() -> QueryKey {
        QueryKey::new("offers")
    }

    pub fn offer_list(filters: &OfferListFilters) -> QueryKey {
        offers().with(filters)
    }

    pub fn offer(id: Option<OfferId>) -> QueryKey {
        offers().with(id)
    }

    pub fn offer_history(id: Option<OfferId>) -> QueryKey {
        offers().with(id).with("history")
    }

    pub fn products() -> QueryKey {
        QueryKey::new("products")
    }

    pub fn health() -> QueryKey {
        QueryKey::new("health")
    }

    pub fn scraper() -> QueryKey {
        QueryKey::new("scraper")
    }

    pub fn scraper_status() -> QueryKey {
        scraper().with("status")
    }
}

/// Pending state for each kind of write, so pages can disable the control
/// that triggered it.
#[derive(Debug, Default)]
pub struct Mutations {
    pub create_offer: MutationState,
    pub update_offer_status: MutationState,
    pub create_product: MutationState,
    pub update_product: MutationState,
    pub delete_product: MutationState,
    pub start_scraper: MutationState,
    pub stop_scraper: MutationState,
    pub run_scraper_once: MutationState,
}

#[derive(Debug, Clone)]
pub struct HooksConfig {
    /// Policy for ordinary reads (offers, products).
    pub read: QueryOptions,
    pub health_stale_time: Duration,
    pub scraper_poll_interval: Duration,
    /// Absolute health URLs tried in order before the API root's `/health`.
    pub health_candidates: Vec<String>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            read: QueryOptions::default(),
            health_stale_time: HEALTH_STALE_TIME,
            scraper_poll_interval: SCRAPER_POLL_INTERVAL,
            health_candidates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hooks {
    api: ApiClient,
    cache: QueryClient,
    config: Arc<HooksConfig>,
    mutations: Arc<Mutations>,
}

impl Hooks {
    pub fn new(api: ApiClient, cache: QueryClient, config: HooksConfig) -> Self {
        Self {
            api,
            cache,
            config: Arc::new(config),
            mutations: Arc::new(Mutations::default()),
        }
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::offer::{OfferListFilters, OfferStatus};

    #[test]
    fn test_offer_family_covers_all_offer_keys() {
        let family = keys::offers();
        assert!(keys::offer_list(&OfferListFilters::default()).starts_with(&family));
        assert!(keys::offer(Some(3)).starts_with(&family));
        assert!(keys::offer_history(Some(3)).starts_with(&family));
        assert!(!keys::products().starts_with(&family));
        assert!(!keys::scraper_status().starts_with(&family));
    }

    #[test]
    fn test_list_and_detail_keys_do_not_collide() {
        let filters = OfferListFilters {
            status: Some(OfferStatus::New),
            ..Default::default()
        };
        assert_ne!(keys::offer_list(&filters), keys::offer(Some(1)));
        assert_ne!(keys::offer(Some(1)), keys::offer_history(Some(1)));
    }
}
