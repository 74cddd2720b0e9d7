//! Smoke screen unit tests for negotiation engine components
//!
//! These are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. They are intended as smoke-screen
//! and generally test the happy path.

use chrono::{Datelike, Duration, Timelike, Utc};
use offer_negotiation::{
    chain::{self, CounterPayload},
    expiry,
    offer::{Currency, Offer, OfferStatus, Role, Side, TimeStamp},
    permissions,
    query::{self, OfferFilter, Page},
    utils::new_uuid_to_bech32,
};

fn sample_offer() -> Offer {
    Offer {
        id: "offer1sample".into(),
        listing_id: "listing1sample".into(),
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

// UTILS MODULE TESTS
mod utils_tests {
    use super::*;

    /// new_uuid_to_bech32 generates valid bech32-encoded strings with the
    /// requested human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("offer");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("offer1"));
        assert!(encoded.len() > 10);
    }

    /// Empty prefixes are refused
    #[test]
    fn handles_empty_hrp() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    /// Multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("offer").unwrap();
        let id2 = new_uuid_to_bech32("offer").unwrap();
        let id3 = new_uuid_to_bech32("offer").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

}

// OFFER MODULE TESTS
mod offer_tests {
    use super::*;

    #[test]
    fn timestamp_new_creates_current_time() {
        let ts = TimeStamp::new();
        let now = Utc::now();

        let diff = (now - ts.to_datetime_utc()).num_seconds().abs();
        assert!(diff < 1);
    }

    #[test]
    fn timestamp_new_with_creates_specific_time() {
        let ts = TimeStamp::new_with(2024, 6, 15, 10, 30, 0);
        let dt = ts.to_datetime_utc();

        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn only_pending_is_live() {
        assert!(!OfferStatus::Pending.is_terminal());
        for status in [
            OfferStatus::Accepted,
            OfferStatus::Rejected,
            OfferStatus::Countered,
            OfferStatus::Withdrawn,
            OfferStatus::Expired,
        ] {
            assert!(status.is_terminal(), "{status:?} should be terminal");
        }
    }

    #[test]
    fn role_resolution() {
        let offer = sample_offer();

        assert_eq!(offer.role_of("user1buyer"), Role::Buyer);
        assert_eq!(offer.role_of("user1seller"), Role::Seller);
        assert_eq!(offer.role_of("user1other"), Role::Unrelated);
    }

    #[test]
    fn responder_is_the_opposite_side() {
        let mut offer = sample_offer();
        assert_eq!(offer.responder(), Side::Seller);

        offer.proposed_by = Side::Seller;
        assert_eq!(offer.responder(), Side::Buyer);
    }

    #[test]
    fn offer_cbor_roundtrip() {
        let mut offer = sample_offer();
        offer.parent_offer_id = Some("offer1parent".into());
        offer.message = Some("negotiable?".into());
        offer.expires_at = Some(TimeStamp::new());

        let encoded = minicbor::to_vec(&offer).unwrap();
        let decoded: Offer = minicbor::decode(&encoded).unwrap();

        assert_eq!(offer, decoded);
    }
}

// PERMISSIONS MODULE TESTS
mod permissions_tests {
    use super::*;

    /// Exactly one side holds the responder rights on a pending offer;
    /// the other holds withdraw only
    #[test]
    fn pending_rights_are_split() {
        let offer = sample_offer();

        let seller = permissions::resolve(&offer, "user1seller");
        assert!(seller.can_accept && seller.can_reject && seller.can_counter);
        assert!(!seller.can_withdraw);

        let buyer = permissions::resolve(&offer, "user1buyer");
        assert!(buyer.can_withdraw);
        assert!(!(buyer.can_accept || buyer.can_reject || buyer.can_counter));
    }

    #[test]
    fn terminal_status_locks_everyone_out() {
        for status in [
            OfferStatus::Accepted,
            OfferStatus::Rejected,
            OfferStatus::Countered,
            OfferStatus::Withdrawn,
            OfferStatus::Expired,
        ] {
            let mut offer = sample_offer();
            offer.status = status;

            for actor in ["user1buyer", "user1seller", "user1other"] {
                assert_eq!(
                    permissions::resolve(&offer, actor),
                    permissions::Permissions::NONE,
                    "{status:?}/{actor} should have no rights"
                );
            }
        }
    }
}

// CHAIN MODULE TESTS
mod chain_tests {
    use super::*;

    #[test]
    fn child_carries_the_negotiation_forward() {
        let parent = sample_offer();
        let now = Utc::now();

        let child = chain::build_child(
            &parent,
            CounterPayload {
                amount: 1_500,
                message: Some("meet in the middle".into()),
                expires_at: None,
            },
            None,
            now,
        )
        .unwrap();

        assert_eq!(child.status, OfferStatus::Pending);
        assert_eq!(child.parent_offer_id.as_deref(), Some("offer1sample"));
        assert_eq!(child.proposed_by, Side::Seller);
        assert_eq!(child.listing_id, parent.listing_id);
        assert_eq!(child.currency, parent.currency);
        assert_eq!(child.created_at, TimeStamp::from(now));
    }

    /// No monotonicity requirement: either side may counter lower
    #[test]
    fn child_amount_may_go_down() {
        let parent = sample_offer();
        let child = chain::build_child(
            &parent,
            CounterPayload {
                amount: 1,
                ..Default::default()
            },
            None,
            Utc::now(),
        )
        .unwrap();

        assert!(child.amount < parent.amount);
    }

    #[test]
    fn explicit_deadline_beats_the_window() {
        let parent = sample_offer();
        let explicit = TimeStamp::new_with(2030, 1, 1, 0, 0, 0);

        let child = chain::build_child(
            &parent,
            CounterPayload {
                amount: 2_000,
                message: None,
                expires_at: Some(explicit.clone()),
            },
            Some(Duration::days(3)),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(child.expires_at, Some(explicit));
    }
}

// EXPIRY MODULE TESTS
mod expiry_tests {
    use super::*;

    #[test]
    fn deadline_in_the_future_is_live() {
        let mut offer = sample_offer();
        offer.expires_at = Some(TimeStamp::from(Utc::now() + Duration::hours(1)));

        assert!(!expiry::is_expired(&offer, Utc::now()));
    }

    #[test]
    fn deadline_in_the_past_is_dead() {
        let mut offer = sample_offer();
        offer.expires_at = Some(TimeStamp::from(Utc::now() - Duration::hours(1)));

        assert!(expiry::is_expired(&offer, Utc::now()));
    }
}

// QUERY MODULE TESTS
mod query_tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(OfferFilter::default().matches(&sample_offer()));
    }

    #[test]
    fn filters_compose() {
        let offer = sample_offer();

        let hit = OfferFilter {
            status: Some(OfferStatus::Pending),
            buyer_id: Some("user1buyer".into()),
            ..Default::default()
        };
        assert!(hit.matches(&offer));

        let miss = OfferFilter {
            status: Some(OfferStatus::Pending),
            buyer_id: Some("user1somebody".into()),
            ..Default::default()
        };
        assert!(!miss.matches(&offer));
    }

    #[test]
    fn pagination_math() {
        let offers: Vec<Offer> = (0..5)
            .map(|i| {
                let mut o = sample_offer();
                o.id = format!("offer1n{i}");
                o
            })
            .collect();

        let page = query::paginate(offers.clone(), Page { page: 2, size: 2 });
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "offer1n2");

        let last = query::paginate(offers.clone(), Page { page: 3, size: 2 });
        assert_eq!(last.items.len(), 1);

        let beyond = query::paginate(offers, Page { page: 9, size: 2 });
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[test]
    fn degenerate_page_sizes_are_clamped() {
        let page = query::paginate(vec![sample_offer()], Page { page: 0, size: 0 });
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = query::paginate(Vec::new(), Page::default());
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
        assert!(page.items.is_empty());
    }
}
