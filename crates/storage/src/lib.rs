//! Object storage for websync.
//!
//! A [`Bucket`] is the remote half of a sync: something that can list its
//! objects with their ETags, accept uploads, and delete in bulk. The S3
//! backend (feature `s3`) is the real thing; [`backend::DryRunBucket`] wraps
//! any bucket to turn writes into log lines, and the in-memory mock (feature
//! `mock`) backs tests in other crates.

pub mod backend;
pub mod content_type;
pub mod error;
mod models;
mod path;

pub use crate::backend::Bucket;
pub use crate::models::ObjectInfo;
pub use crate::path::{object_key, validate as validate_path};
use std::sync::Arc;
pub use websync_fingerprint::ChunkSize;

pub type BucketHandle = Arc<dyn Bucket + Send + Sync>;
