//! Collaborator contracts the engine consumes
//!
//! The engine trusts identity entirely (actor ids arrive pre-authenticated)
//! and talks to the catalog only at offer-creation time. Notifications are
//! fire-and-forget; a failing notifier never rolls a transition back.

use std::collections::HashMap;
use std::sync::Mutex;

use super::offer::{Currency, OfferStatus};

/// What the catalog knows about a listing, as of offer creation.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: String,
    pub seller_id: String,
    pub price: u64,
    pub currency: Currency,
}

pub trait Catalog: Send + Sync {
    /// `Ok(None)` means the listing does not exist; `Err` means the
    /// catalog itself could not answer.
    fn listing(&self, listing_id: &str) -> anyhow::Result<Option<Listing>>;
}

pub trait Notifier: Send + Sync {
    fn transition_applied(
        &self,
        offer_id: &str,
        status: OfferStatus,
        actor: &str,
    ) -> anyhow::Result<()>;
}

/// Default notifier: drops everything on the floor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn transition_applied(&self, _: &str, _: OfferStatus, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Catalog backed by a plain map, for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    listings: Mutex<HashMap<String, Listing>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, listing: Listing) {
        self.listings
            .lock()
            .expect("catalog lock poisoned")
            .insert(listing.id.clone(), listing);
    }
}

impl Catalog for InMemoryCatalog {
    fn listing(&self, listing_id: &str) -> anyhow::Result<Option<Listing>> {
        Ok(self
            .listings
            .lock()
            .expect("catalog lock poisoned")
            .get(listing_id)
            .cloned())
    }
}

/// Notifier that records every event it sees, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(String, OfferStatus, String)>>,
}

impl Notifier for RecordingNotifier {
    fn transition_applied(
        &self,
        offer_id: &str,
        status: OfferStatus,
        actor: &str,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .expect("notifier lock poisoned")
            .push((offer_id.to_string(), status, actor.to_string()));
        Ok(())
    }
}
