use thiserror::Error;
use uuid::Uuid;

pub type RevlensResult<T> = Result<T, RevlensError>;

/// Error taxonomy for the attribution engine.
///
/// Unit-of-work failures (one contact, one touchpoint) are contained at that
/// unit's boundary: malformed raw records are dropped during normalization,
/// and a single contact's failure during a bulk run is logged and excluded
/// from aggregates. Only `ContactNotFound` on a direct single-contact
/// request reaches the caller.
#[derive(Error, Debug)]
pub enum RevlensError {
    #[error("contact not found: {0}")]
    ContactNotFound(Uuid),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("contact store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
