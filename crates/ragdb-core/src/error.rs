use thiserror::Error;

/// Fatal, build-time failures. Per-request degradations (an unreachable
/// dense partition, a candidate pool that scored empty) are not errors:
/// the aggregator logs and degrades instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown partition: {0}")]
    UnknownPartition(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
