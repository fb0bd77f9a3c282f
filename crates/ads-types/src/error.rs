use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid distribution level: {0}")]
    InvalidDistribution(String),

    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("unknown target type: {0}")]
    UnknownTarget(String),

    #[error("invalid or could not deduce analyst data type: {0}")]
    InvalidRecord(String),
}
