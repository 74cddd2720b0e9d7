//! Read-side filter and pagination types

use super::offer::{Offer, OfferStatus};

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub status: Option<OfferStatus>,
    pub listing_id: Option<String>,
    pub buyer_id: Option<String>,
    pub seller_id: Option<String>,
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        self.status.is_none_or(|s| s == offer.status)
            && self
                .listing_id
                .as_ref()
                .is_none_or(|l| *l == offer.listing_id)
            && self.buyer_id.as_ref().is_none_or(|b| *b == offer.buyer_id)
            && self
                .seller_id
                .as_ref()
                .is_none_or(|s| *s == offer.seller_id)
    }
}

/// 1-based page request. A zero size is clamped to 1 so pagination math
/// stays total.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: usize,
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedOffers {
    pub items: Vec<Offer>,
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub pages: usize,
}

pub fn paginate(offers: Vec<Offer>, page: Page) -> PaginatedOffers {
    let size = page.size.max(1);
    let number = page.page.max(1);
    let total = offers.len();
    let pages = total.div_ceil(size);

    let items = offers
        .into_iter()
        .skip((number - 1) * size)
        .take(size)
        .collect();

    PaginatedOffers {
        items,
        total,
        page: number,
        size,
        pages,
    }
}
