#[derive(thiserror::Error, Debug)]
pub enum OfferError {
    #[error("offer not found: {0}")]
    NotFound(String),
    #[error("{actor} may not {action} offer {offer_id}")]
    Forbidden {
        offer_id: String,
        actor: String,
        action: &'static str,
    },
    #[error("offer {0} expired before the request could be applied")]
    Expired(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("offer {0} was modified concurrently, reload and retry")]
    Conflict(String),
    #[error("catalog unavailable for listing {0}")]
    UpstreamUnavailable(String),
    #[error("store failure")]
    Store(#[from] sled::Error),
    #[error("codec failure: {0}")]
    Codec(String),
    #[error("internal error: {0}")]
    Internal(String),
}
