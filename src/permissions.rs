//! Pure permission resolution for offer transitions
//!
//! Computed from the offer snapshot and the acting user alone, nothing
//! else is consulted. Expiration is the caller's problem and runs before
//! this resolver ever sees the snapshot.

use super::offer::Offer;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Permissions {
    pub can_accept: bool,
    pub can_reject: bool,
    pub can_counter: bool,
    pub can_withdraw: bool,
}

impl Permissions {
    pub const NONE: Self = Self {
        can_accept: false,
        can_reject: false,
        can_counter: false,
        can_withdraw: false,
    };
}

/// Which transitions `acting_user_id` may currently perform on `offer`.
///
/// Terminal status or an unrelated actor yields no rights at all. On a
/// pending offer the side awaiting response may accept, reject or
/// counter; the side that proposed it may only withdraw it.
pub fn resolve(offer: &Offer, acting_user_id: &str) -> Permissions {
    if offer.status.is_terminal() {
        return Permissions::NONE;
    }

    let Some(side) = offer.role_of(acting_user_id).side() else {
        return Permissions::NONE;
    };

    if side == offer.responder() {
        Permissions {
            can_accept: true,
            can_reject: true,
            can_counter: true,
            can_withdraw: false,
        }
    } else {
        Permissions {
            can_withdraw: true,
            ..Permissions::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{Currency, OfferStatus, Side, TimeStamp};

    fn pending_offer() -> Offer {
        Offer {
            id: "offer1a".into(),
            listing_id: "listing1a".into(),
            buyer_id: "user1buyer".into(),
            seller_id: "user1seller".into(),
            amount: 1_000,
            currency: Currency::USD,
            status: OfferStatus::Pending,
            proposed_by: Side::Buyer,
            parent_offer_id: None,
            message: None,
            expires_at: None,
            created_at: TimeStamp::new(),
            updated_at: TimeStamp::new(),
        }
    }

    #[test]
    fn seller_responds_to_buyer_proposal() {
        let offer = pending_offer();

        let seller = resolve(&offer, "user1seller");
        assert!(seller.can_accept && seller.can_reject && seller.can_counter);
        assert!(!seller.can_withdraw);

        let buyer = resolve(&offer, "user1buyer");
        assert!(buyer.can_withdraw);
        assert!(!buyer.can_accept && !buyer.can_reject && !buyer.can_counter);
    }

    #[test]
    fn roles_swap_when_seller_proposed() {
        let mut offer = pending_offer();
        offer.proposed_by = Side::Seller;

        let buyer = resolve(&offer, "user1buyer");
        assert!(buyer.can_accept && buyer.can_reject && buyer.can_counter);

        let seller = resolve(&offer, "user1seller");
        assert_eq!(
            seller,
            Permissions {
                can_withdraw: true,
                ..Permissions::NONE
            }
        );
    }

    #[test]
    fn stranger_gets_nothing() {
        let offer = pending_offer();
        assert_eq!(resolve(&offer, "user1nobody"), Permissions::NONE);
    }
}
