//! Bucket trait and implementations.
//!
//! This module defines the [`Bucket`] trait: the narrow set of object storage
//! operations a directory sync needs (list, upload, bulk delete) plus the
//! shared chunk size that ties local fingerprints to remote ETags.

mod dry_run;
#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::dry_run::DryRunBucket;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockBucket, MockObject};
#[cfg(feature = "s3")]
pub use self::s3::{S3Backend, website_endpoint};
use crate::content_type;
use crate::error::Result;
use crate::models::ObjectInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;
use websync_fingerprint::ChunkSize;

pub type ObjectInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<ObjectInfo>> + Send + 'a>>;

/// Object storage as seen by a directory sync.
///
/// Keys are POSIX-style paths relative to the bucket (or to the backend's
/// configured prefix). Implementations are expected to be cheap to share
/// behind an [`Arc`](std::sync::Arc); see [`BucketHandle`](crate::BucketHandle).
///
/// # Examples
///
/// ```
/// use futures::TryStreamExt;
/// use websync_storage::{backend::Bucket, error::Result};
///
/// async fn total_size(bucket: &dyn Bucket) -> Result<u64> {
///     let mut total = 0;
///     let mut objects = bucket.list_stream();
///     while let Some(object) = objects.try_next().await? {
///         total += object.size;
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Bucket name (used for logging and reporting).
    fn name(&self) -> &str;

    /// Chunk size used as the multipart threshold and part size for uploads.
    ///
    /// Local fingerprints **must** be computed with this same value for them
    /// to compare equal to the ETags this bucket reports.
    fn chunk_size(&self) -> ChunkSize;

    /// List every object.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`].
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream every object, fetching further pages as the stream is polled.
    fn list_stream(&self) -> ObjectInfoStream<'_>;

    /// `Content-Type` to upload `key` with. Unknown extensions fall back to
    /// `text/plain`.
    fn content_type(&self, key: &str) -> &'static str {
        content_type::from_key(key)
    }

    /// Upload a local file under `key`, replacing any existing object.
    ///
    /// Files larger than [`chunk_size()`](Self::chunk_size) are expected to
    /// be sent as multipart uploads with that part size.
    async fn upload(&self, key: &str, source: &Path, content_type: &str) -> Result<()>;

    /// Delete many objects, returning the keys that were deleted.
    ///
    /// Best effort: keys the provider refuses to delete are left out of the
    /// result rather than failing the call. An empty `keys` is a no-op.
    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>>;
}
