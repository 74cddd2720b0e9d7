//! Service layer API for the negotiation workflow
//!
//! `OfferService` is the only mutation path: every transition goes through
//! the load → expire → permission → compare-and-swap pipeline, so no
//! caller can bypass the state machine.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::chain::{self, CounterPayload};
use super::collab::{Catalog, Notifier, NullNotifier};
use super::error::OfferError;
use super::expiry;
use super::offer::{Offer, OfferStatus, Side, TimeStamp};
use super::permissions::{self, Permissions};
use super::query::{self, OfferFilter, Page, PaginatedOffers};
use super::store::{OfferStore, VersionedOffer};
use super::utils;

/// Both records touched by a successful counter.
#[derive(Debug, Clone)]
pub struct CounterOutcome {
    pub parent: Offer,
    pub child: Offer,
}

#[derive(Debug, Clone, Copy)]
enum TransitionKind {
    Accept,
    Reject,
    Withdraw,
}

impl TransitionKind {
    const fn action(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Withdraw => "withdraw",
        }
    }

    const fn target(self) -> OfferStatus {
        match self {
            Self::Accept => OfferStatus::Accepted,
            Self::Reject => OfferStatus::Rejected,
            Self::Withdraw => OfferStatus::Withdrawn,
        }
    }

    /// Which side was entitled to perform this transition, derivable even
    /// after the fact since `proposed_by` never changes on a record.
    const fn permitted_side(self, offer: &Offer) -> Side {
        match self {
            Self::Accept | Self::Reject => offer.responder(),
            Self::Withdraw => offer.proposed_by,
        }
    }

    const fn allowed(self, perms: &Permissions) -> bool {
        match self {
            Self::Accept => perms.can_accept,
            Self::Reject => perms.can_reject,
            Self::Withdraw => perms.can_withdraw,
        }
    }
}

pub struct OfferService {
    store: OfferStore,
    catalog: Arc<dyn Catalog>,
    notifier: Arc<dyn Notifier>,
    negotiation_window: Option<Duration>,
}

impl OfferService {
    pub fn new(instance: Arc<sled::Db>, catalog: Arc<dyn Catalog>) -> Result<Self, OfferError> {
        Ok(Self {
            store: OfferStore::open(&instance)?,
            catalog,
            notifier: Arc::new(NullNotifier),
            negotiation_window: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Default deadline applied to new offers and counter children that
    /// carry no explicit `expires_at`.
    pub fn with_negotiation_window(mut self, window: Duration) -> Self {
        self.negotiation_window = Some(window);
        self
    }

    /// Open a negotiation: a buyer proposes a price against a listing.
    /// The seller is whoever the catalog says owns the listing; a seller
    /// enters the back-and-forth by countering, not by creating.
    pub fn create_offer(
        &self,
        listing_id: &str,
        buyer_id: &str,
        amount: u64,
        message: Option<String>,
        expires_at: Option<TimeStamp<Utc>>,
    ) -> Result<Offer, OfferError> {
        if amount == 0 {
            return Err(OfferError::InvalidPayload(
                "offer amount must be non-zero".into(),
            ));
        }

        let listing = self
            .catalog
            .listing(listing_id)
            .map_err(|err| {
                tracing::warn!(listing_id, %err, "catalog lookup failed");
                OfferError::UpstreamUnavailable(listing_id.to_string())
            })?
            .ok_or_else(|| OfferError::NotFound(listing_id.to_string()))?;

        if buyer_id == listing.seller_id {
            return Err(OfferError::InvalidPayload(
                "buyer may not offer on their own listing".into(),
            ));
        }

        let now = Utc::now();
        let expires_at = expires_at.or_else(|| {
            self.negotiation_window
                .map(|w| TimeStamp::from(now + w))
        });

        let offer = Offer {
            id: utils::new_uuid_to_bech32("offer")
                .map_err(|e| OfferError::Internal(e.to_string()))?,
            listing_id: listing.id,
            buyer_id: buyer_id.to_string(),
            seller_id: listing.seller_id,
            amount,
            currency: listing.currency,
            status: OfferStatus::Pending,
            proposed_by: Side::Buyer,
            parent_offer_id: None,
            message,
            expires_at,
            created_at: TimeStamp::from(now),
            updated_at: TimeStamp::from(now),
        };

        self.store.insert_new(&offer)?;
        tracing::debug!(offer_id = %offer.id, listing_id, "offer created");
        self.notify(&offer, buyer_id);

        Ok(offer)
    }

    pub fn accept(&self, offer_id: &str, actor: &str) -> Result<Offer, OfferError> {
        self.apply_simple(offer_id, actor, TransitionKind::Accept)
    }

    pub fn reject(&self, offer_id: &str, actor: &str) -> Result<Offer, OfferError> {
        self.apply_simple(offer_id, actor, TransitionKind::Reject)
    }

    pub fn withdraw(&self, offer_id: &str, actor: &str) -> Result<Offer, OfferError> {
        self.apply_simple(offer_id, actor, TransitionKind::Withdraw)
    }

    /// Counter a pending offer: the parent flips to `Countered` and a
    /// fresh pending child is created in the same atomic write.
    pub fn counter(
        &self,
        offer_id: &str,
        actor: &str,
        payload: CounterPayload,
    ) -> Result<CounterOutcome, OfferError> {
        let versioned = self.load_live(offer_id)?;
        let offer = &versioned.offer;

        if !permissions::resolve(offer, actor).can_counter {
            return Err(OfferError::Forbidden {
                offer_id: offer_id.to_string(),
                actor: actor.to_string(),
                action: "counter",
            });
        }
        if payload.amount == 0 {
            return Err(OfferError::InvalidPayload(
                "counter amount must be non-zero".into(),
            ));
        }

        let now = Utc::now();
        let child = chain::build_child(offer, payload, self.negotiation_window, now)?;

        let mut parent = offer.clone();
        parent.status = OfferStatus::Countered;
        parent.updated_at = TimeStamp::from(now);

        self.store.swap_with_child(&versioned, &parent, &child)?;
        tracing::debug!(
            parent_id = %parent.id,
            child_id = %child.id,
            amount = child.amount,
            "counter applied"
        );
        self.notify(&parent, actor);
        self.notify(&child, actor);

        Ok(CounterOutcome { parent, child })
    }

    /// Read one offer, expiry-coerced. Unlike a transition, reading an
    /// expired offer is not an error; the coerced snapshot is returned.
    pub fn get_offer(&self, offer_id: &str) -> Result<Offer, OfferError> {
        let versioned = self
            .store
            .get(offer_id)?
            .ok_or_else(|| OfferError::NotFound(offer_id.to_string()))?;

        if expiry::is_expired(&versioned.offer, Utc::now()) {
            return self.coerce_expired(versioned);
        }
        Ok(versioned.offer)
    }

    /// Filtered, paginated listing. Runs the expiration rule over every
    /// record first so list views never show a practically-dead offer as
    /// pending.
    pub fn list_offers(
        &self,
        filter: &OfferFilter,
        page: Page,
    ) -> Result<PaginatedOffers, OfferError> {
        let now = Utc::now();
        let mut matched = Vec::new();

        for versioned in self.store.scan()? {
            let offer = if expiry::is_expired(&versioned.offer, now) {
                self.coerce_expired(versioned)?
            } else {
                versioned.offer
            };
            if filter.matches(&offer) {
                matched.push(offer);
            }
        }

        // Scan order is by id bytes, which is meaningless to a caller.
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(query::paginate(matched, page))
    }

    /// The whole negotiation history the given offer belongs to, root
    /// first, walked through the parent/child index.
    pub fn chain(&self, offer_id: &str) -> Result<Vec<Offer>, OfferError> {
        let mut current = self.get_offer(offer_id)?;
        while let Some(parent_id) = current.parent_offer_id.clone() {
            current = self.get_offer(&parent_id)?;
        }

        let mut tip = current.id.clone();
        let mut records = vec![current];
        while let Some(child_id) = self.store.child_of(&tip)? {
            let child = self.get_offer(&child_id)?;
            tip = child.id.clone();
            records.push(child);
        }

        Ok(records)
    }

    /// Proactive pass over the store for timely list views. Returns how
    /// many offers were newly coerced to `Expired`.
    pub fn sweep_expired(&self) -> Result<usize, OfferError> {
        let now = Utc::now();
        let mut swept = 0;

        for versioned in self.store.scan()? {
            if expiry::is_expired(&versioned.offer, now)
                && self.coerce_expired(versioned)?.status == OfferStatus::Expired
            {
                swept += 1;
            }
        }

        tracing::debug!(swept, "expiration sweep finished");
        Ok(swept)
    }

    /// Shared pipeline for the payload-free transitions. Order matters:
    /// expiration, then the idempotent-retry shortcut, then permissions,
    /// then the compare-and-swap write.
    fn apply_simple(
        &self,
        offer_id: &str,
        actor: &str,
        kind: TransitionKind,
    ) -> Result<Offer, OfferError> {
        let versioned = self.load_live(offer_id)?;
        let offer = &versioned.offer;

        // Retry safety: if the desired end state already holds and the
        // actor is the side that was entitled to bring it about, report
        // success with the stored snapshot instead of erroring.
        if offer.status == kind.target() {
            let acting_side = offer.role_of(actor).side();
            if acting_side == Some(kind.permitted_side(offer)) {
                tracing::debug!(offer_id, action = kind.action(), "idempotent retry");
                return Ok(offer.clone());
            }
        }

        if !kind.allowed(&permissions::resolve(offer, actor)) {
            return Err(OfferError::Forbidden {
                offer_id: offer_id.to_string(),
                actor: actor.to_string(),
                action: kind.action(),
            });
        }

        let mut next = offer.clone();
        next.status = kind.target();
        next.updated_at = TimeStamp::new();

        self.store.swap(&versioned, &next)?;
        tracing::debug!(offer_id, status = ?next.status, "transition applied");
        self.notify(&next, actor);

        Ok(next)
    }

    /// Load for a transition. A pending offer past its deadline is
    /// persisted as `Expired` here and the request fails with `Expired`;
    /// the caller must re-fetch.
    fn load_live(&self, offer_id: &str) -> Result<VersionedOffer, OfferError> {
        let versioned = self
            .store
            .get(offer_id)?
            .ok_or_else(|| OfferError::NotFound(offer_id.to_string()))?;

        if expiry::is_expired(&versioned.offer, Utc::now()) {
            self.coerce_expired(versioned)?;
            return Err(OfferError::Expired(offer_id.to_string()));
        }

        Ok(versioned)
    }

    /// Persist the lazy `Pending -> Expired` coercion. Losing the swap to
    /// a concurrent writer is fine; whatever won the race is returned.
    fn coerce_expired(&self, versioned: VersionedOffer) -> Result<Offer, OfferError> {
        let mut expired = versioned.offer.clone();
        expired.status = OfferStatus::Expired;
        expired.updated_at = TimeStamp::new();

        match self.store.swap(&versioned, &expired) {
            Ok(()) => {
                tracing::debug!(offer_id = %expired.id, "pending offer lapsed past its deadline");
                Ok(expired)
            }
            Err(OfferError::Conflict(_)) => self
                .store
                .get(&expired.id)?
                .map(|v| v.offer)
                .ok_or_else(|| OfferError::NotFound(expired.id.clone())),
            Err(e) => Err(e),
        }
    }

    fn notify(&self, offer: &Offer, actor: &str) {
        if let Err(err) = self
            .notifier
            .transition_applied(&offer.id, offer.status, actor)
        {
            tracing::warn!(offer_id = %offer.id, %err, "notifier failed; transition stands");
        }
    }
}
