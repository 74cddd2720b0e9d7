//! Lazy expiration rule
//!
//! A pending offer whose deadline has passed is practically dead; the
//! service coerces it to `Expired` the next time it is read or acted on.
//! No background job is required, though `OfferService::sweep_expired`
//! can run periodically to keep list views timely.

use chrono::{DateTime, Utc};

use super::offer::{Offer, OfferStatus};

pub fn is_expired(offer: &Offer, now: DateTime<Utc>) -> bool {
    offer.status == OfferStatus::Pending
        && offer
            .expires_at
            .as_ref()
            .is_some_and(|deadline| deadline.to_datetime_utc() < now)
}
