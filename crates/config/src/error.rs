//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Merging or deserializing the configuration layers failed.
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// Chunk size is zero or doesn't fit in memory on this platform.
    #[display("invalid chunk size: {_0}")]
    InvalidChunkSize(#[error(not(source))] u64),
    /// No access key id and secret were configured.
    #[display("missing S3 credentials (set s3.key_id and s3.key_secret, or AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY)")]
    MissingCredentials,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
