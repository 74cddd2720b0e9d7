//! Core offer record and the types that hang off it
use chrono::{DateTime, TimeZone, Utc};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum Currency {
    #[n(0)]
    USD,
    #[n(1)]
    GBP,
    #[n(2)]
    EUR,
}

/// Which negotiating party an offer record belongs to.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Side {
    #[n(0)]
    Buyer,
    #[n(1)]
    Seller,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buyer => Self::Seller,
            Self::Seller => Self::Buyer,
        }
    }
}

/// Where an acting user stands relative to one offer. Computed once per
/// request and threaded into permission resolution.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Role {
    Buyer,
    Seller,
    Unrelated,
}

impl Role {
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Buyer => Some(Side::Buyer),
            Self::Seller => Some(Side::Seller),
            Self::Unrelated => None,
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum OfferStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Accepted,
    #[n(2)]
    Rejected,
    #[n(3)]
    Countered,
    #[n(4)]
    Withdrawn,
    #[n(5)]
    Expired,
}

impl OfferStatus {
    /// Everything except `Pending` is terminal for the record. A `Countered`
    /// record never changes again either; the negotiation continues on its
    /// child.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone> PartialEq for TimeStamp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: TimeZone> Eq for TimeStamp<T> {}

impl<T: TimeZone> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// One proposed price against a listing. Key in the store is the `id`;
/// counter-offers link back through `parent_offer_id` so the full
/// negotiation history survives as a chain of records.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub struct Offer {
    #[n(0)]
    pub id: String, // bech32-encoded uuid7, immutable
    #[n(1)]
    pub listing_id: String,
    #[n(2)]
    pub buyer_id: String,
    #[n(3)]
    pub seller_id: String, // the listing owner, fixed for the whole chain
    #[n(4)]
    pub amount: u64, // minor currency units, never zero
    #[n(5)]
    pub currency: Currency,
    #[n(6)]
    pub status: OfferStatus,
    #[n(7)]
    pub proposed_by: Side, // flips on every counter
    #[n(8)]
    pub parent_offer_id: Option<String>,
    #[n(9)]
    pub message: Option<String>,
    #[n(10)]
    pub expires_at: Option<TimeStamp<Utc>>,
    #[n(11)]
    pub created_at: TimeStamp<Utc>,
    #[n(12)]
    pub updated_at: TimeStamp<Utc>,
}

impl Offer {
    pub fn role_of(&self, user_id: &str) -> Role {
        if user_id == self.buyer_id {
            Role::Buyer
        } else if user_id == self.seller_id {
            Role::Seller
        } else {
            Role::Unrelated
        }
    }

    /// The side currently awaiting response, i.e. the one that may
    /// accept, reject or counter while the offer is pending.
    pub const fn responder(&self) -> Side {
        self.proposed_by.opposite()
    }

    pub fn party(&self, side: Side) -> &str {
        match side {
            Side::Buyer => &self.buyer_id,
            Side::Seller => &self.seller_id,
        }
    }
}
