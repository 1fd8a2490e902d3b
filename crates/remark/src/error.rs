use std::io;

/// Feed engine errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("subscription error: {0}")]
    Subscription(SubscriptionError),

    #[error("day id error: {0}")]
    DayId(#[from] DayIdError),

    #[error("generic error: {0}")]
    Generic(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

/// Failures reported by a record store.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached. Reads that fail this way leave the
    /// day unresolved; it is retried the next time it becomes visible.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A live subscription was torn down by the store.
    #[error("subscription closed by store: {0}")]
    Closed(String),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SubscriptionError {
    /// The live window subscription was dropped. The hosting screen has to
    /// re-establish it, otherwise the window goes stale.
    #[error("live subscription lost: {0}")]
    Lost(StoreError),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DayIdError {
    #[error("'{0}' is not a YYYY-MM-DD day id")]
    Malformed(String),

    #[error("'{0}' is not a calendar day")]
    NoSuchDay(String),
}
