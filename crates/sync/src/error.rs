//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Storage and fingerprint failures are
//! raised into these kinds, so the original cause stays in the error tree.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sync error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a sync failure.
///
/// ### Fatal Errors
/// Nothing can be synced; the run stops.
/// - [`ErrorKind::InvalidRoot`]
/// - [`ErrorKind::Manifest`]
///
/// ### Per-file Errors
/// The file is skipped and reported; the run continues.
/// - [`ErrorKind::Fingerprint`]
/// - [`ErrorKind::Upload`]
/// - [`ErrorKind::InvalidKey`]
///
/// ### Walk and Reconcile Errors
/// - [`ErrorKind::Walk`] - part of the tree could not be read.
/// - [`ErrorKind::IncompleteWalk`] - deletions were skipped because of an
///   earlier [`ErrorKind::Walk`].
/// - [`ErrorKind::Reconcile`] - the bulk delete failed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The local root does not exist or is not a directory.
    #[display("sync root is not a readable directory: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// Listing the bucket failed.
    #[display("could not list remote objects")]
    Manifest,
    /// A directory (or entry inside one) could not be read.
    #[display("could not read {}", _0.display())]
    Walk(#[error(not(source))] PathBuf),
    /// A local path cannot be represented as an object key.
    #[display("cannot derive an object key for {}", _0.display())]
    InvalidKey(#[error(not(source))] PathBuf),
    /// Reading the local file to fingerprint it failed.
    #[display("could not fingerprint {_0}")]
    Fingerprint(#[error(not(source))] String),
    /// Uploading the local file failed.
    #[display("could not upload {_0}")]
    Upload(#[error(not(source))] String),
    /// Some of the tree was unreadable, so stale objects were not deleted.
    #[display("local tree was not fully read; skipped removing stale objects")]
    IncompleteWalk,
    /// The bulk delete of stale objects failed.
    #[display("could not remove stale objects")]
    Reconcile,
}

impl ErrorKind {
    /// Returns `true` if the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidRoot(_) | Self::Manifest)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidRoot(_) | Self::InvalidKey(_) => false,
            Self::Manifest
            | Self::Walk(_)
            | Self::Fingerprint(_)
            | Self::Upload(_)
            | Self::IncompleteWalk
            | Self::Reconcile => true,
        }
    }
}
