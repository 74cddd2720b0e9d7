//! Durable offer store over sled
//!
//! Two trees: `offers` keyed by offer id, and `offers_by_parent` mapping a
//! countered parent's id to its single child's id.
//!
//! Every mutation is conditioned on the raw bytes read earlier still being
//! in place, which is what makes concurrent transitions on one offer
//! linearizable: the loser of a race gets `Conflict`, never a silent
//! overwrite.

use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionError};

use super::error::OfferError;
use super::offer::Offer;

/// An offer snapshot paired with the exact bytes it was read from, used
/// as the expected value in compare-and-swap writes.
#[derive(Debug, Clone)]
pub struct VersionedOffer {
    pub offer: Offer,
    raw: sled::IVec,
}

pub struct OfferStore {
    offers: sled::Tree,
    by_parent: sled::Tree,
}

impl OfferStore {
    pub fn open(db: &sled::Db) -> Result<Self, OfferError> {
        Ok(Self {
            offers: db.open_tree("offers")?,
            by_parent: db.open_tree("offers_by_parent")?,
        })
    }

    fn encode(offer: &Offer) -> Result<Vec<u8>, OfferError> {
        minicbor::to_vec(offer).map_err(|e| OfferError::Codec(e.to_string()))
    }

    fn decode(raw: &[u8]) -> Result<Offer, OfferError> {
        minicbor::decode(raw).map_err(|e| OfferError::Codec(e.to_string()))
    }

    pub fn get(&self, id: &str) -> Result<Option<VersionedOffer>, OfferError> {
        match self.offers.get(id.as_bytes())? {
            Some(raw) => {
                let offer = Self::decode(&raw)?;
                Ok(Some(VersionedOffer { offer, raw }))
            }
            None => Ok(None),
        }
    }

    /// Insert a brand-new record. The key must be vacant; a collision
    /// means id generation misbehaved and is reported as a conflict.
    pub fn insert_new(&self, offer: &Offer) -> Result<(), OfferError> {
        let bytes = Self::encode(offer)?;
        match self
            .offers
            .compare_and_swap(offer.id.as_bytes(), None::<&[u8]>, Some(bytes))?
        {
            Ok(()) => Ok(()),
            Err(_) => Err(OfferError::Conflict(offer.id.clone())),
        }
    }

    /// Replace `prev` with `next`, failing with `Conflict` when the stored
    /// record no longer matches the bytes `prev` was read from.
    pub fn swap(&self, prev: &VersionedOffer, next: &Offer) -> Result<(), OfferError> {
        let bytes = Self::encode(next)?;
        match self
            .offers
            .compare_and_swap(next.id.as_bytes(), Some(&prev.raw), Some(bytes))?
        {
            Ok(()) => Ok(()),
            Err(_) => Err(OfferError::Conflict(next.id.clone())),
        }
    }

    /// The counter write: flip the parent, create the child, index the
    /// link. All-or-nothing; a parent marked `Countered` without its child
    /// (or the reverse) must never be observable.
    pub fn swap_with_child(
        &self,
        prev: &VersionedOffer,
        parent: &Offer,
        child: &Offer,
    ) -> Result<(), OfferError> {
        let parent_bytes = Self::encode(parent)?;
        let child_bytes = Self::encode(child)?;

        let result = (&self.offers, &self.by_parent).transaction(|(offers, by_parent)| {
            let current = offers.get(parent.id.as_bytes())?;
            if current.as_deref() != Some(&prev.raw[..]) {
                return Err(ConflictableTransactionError::Abort(()));
            }

            offers.insert(parent.id.as_bytes(), parent_bytes.clone())?;
            offers.insert(child.id.as_bytes(), child_bytes.clone())?;
            by_parent.insert(parent.id.as_bytes(), child.id.as_bytes())?;

            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(())) => Err(OfferError::Conflict(parent.id.clone())),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    /// Indexed child lookup; chain traversal is a sequence of these, never
    /// pointer-following.
    pub fn child_of(&self, parent_id: &str) -> Result<Option<String>, OfferError> {
        Ok(self
            .by_parent
            .get(parent_id.as_bytes())?
            .map(|raw| String::from_utf8_lossy(&raw).into_owned()))
    }

    /// Full scan. The store stays small per deployment; filtering and
    /// ordering are the caller's concern.
    pub fn scan(&self) -> Result<Vec<VersionedOffer>, OfferError> {
        let mut out = Vec::new();
        for entry in self.offers.iter() {
            let (_, raw) = entry?;
            let offer = Self::decode(&raw)?;
            out.push(VersionedOffer { offer, raw });
        }
        Ok(out)
    }
}
