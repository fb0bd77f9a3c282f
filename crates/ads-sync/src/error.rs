use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] ads_types::TypeError),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("network failure with peer #{peer} while {context}: {message}")]
    Network {
        peer: u64,
        context: String,
        message: String,
    },

    #[error("remote error: {0}")]
    Remote(String),

    #[error("store error: {0}")]
    Store(#[from] ads_store::StoreError),
}

impl SyncError {
    pub fn network(peer: u64, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            peer,
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
