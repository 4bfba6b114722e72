//! One-way synchronization of a local directory tree into a bucket.
//!
//! The remote side is described once per run by a [`Manifest`] (key to ETag).
//! Every local file is fingerprinted with the bucket's chunk size and compared
//! against its manifest entry: equal means skip, anything else means upload.
//! Whatever is left in the manifest after the walk no longer exists locally
//! and is deleted in one bulk call.
//!
//! The primary entry point is [`sync`], which streams [`SyncEvent`]s as it
//! goes. [`sync_all`] drives that stream to completion and collects a
//! [`SyncReport`].

pub mod error;
mod file;
mod manifest;
mod report;
mod stream;
mod walk;

pub use self::file::{Action, sync_file};
pub use self::manifest::Manifest;
pub use self::report::{SyncReport, sync_all};
pub use self::stream::{SyncEvent, sync};
pub use self::walk::{LocalFile, walk};
