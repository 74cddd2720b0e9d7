//! Counter-offer chain building
//!
//! A counter closes out its parent and opens a fresh pending record that
//! links back through `parent_offer_id`. Parties never change down a
//! chain; only the proposing side flips.

use chrono::{DateTime, Duration, Utc};

use super::error::OfferError;
use super::offer::{Offer, OfferStatus, TimeStamp};
use super::utils;

/// Payload of a `counter` transition. The deadline is optional; when the
/// service carries a default negotiation window it is applied instead.
#[derive(Debug, Clone, Default)]
pub struct CounterPayload {
    pub amount: u64,
    pub message: Option<String>,
    pub expires_at: Option<TimeStamp<Utc>>,
}

/// Derive the pending child record for a counter against `parent`.
///
/// The deadline is, in order of preference: the payload's explicit one,
/// a fresh `now + window` when a default window is configured, none.
/// Persisting the child together with the parent's flip to `Countered`
/// is the store's job; this only shapes the record.
pub fn build_child(
    parent: &Offer,
    payload: CounterPayload,
    window: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<Offer, OfferError> {
    let id = utils::new_uuid_to_bech32("offer").map_err(|e| OfferError::Internal(e.to_string()))?;

    let expires_at = payload
        .expires_at
        .or_else(|| window.map(|w| TimeStamp::from(now + w)));

    Ok(Offer {
        id,
        listing_id: parent.listing_id.clone(),
        buyer_id: parent.buyer_id.clone(),
        seller_id: parent.seller_id.clone(),
        amount: payload.amount,
        currency: parent.currency,
        status: OfferStatus::Pending,
        proposed_by: parent.proposed_by.opposite(),
        parent_offer_id: Some(parent.id.clone()),
        message: payload.message,
        expires_at,
        created_at: TimeStamp::from(now),
        updated_at: TimeStamp::from(now),
    })
}
