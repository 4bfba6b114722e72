//! Dry-run bucket.
//!
//! Wraps another bucket and prevents write operations from executing, but
//! indicates success on return so a sync reports what it *would* have done.

use async_trait::async_trait;
use std::path::Path;
use websync_fingerprint::ChunkSize;

use crate::{BucketHandle, backend::Bucket, backend::ObjectInfoStream, error::Result};

/// Dry-run bucket.
///
/// Listing goes to the wrapped bucket; uploads and deletes are dropped after
/// logging an [`info event`](tracing::Event).
#[derive(Clone)]
pub struct DryRunBucket {
    inner: BucketHandle,
}
impl DryRunBucket {
    pub fn new(inner: BucketHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Bucket for DryRunBucket {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn chunk_size(&self) -> ChunkSize {
        self.inner.chunk_size()
    }

    fn list_stream(&self) -> ObjectInfoStream<'_> {
        self.inner.list_stream()
    }

    fn content_type(&self, key: &str) -> &'static str {
        self.inner.content_type(key)
    }

    async fn upload(&self, key: &str, source: &Path, content_type: &str) -> Result<()> {
        tracing::info!(bucket = self.name(), key, source = %source.display(), content_type, "Skipping upload during dry run");
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>> {
        tracing::info!(bucket = self.name(), count = keys.len(), "Skipping delete during dry run");
        Ok(keys.to_vec())
    }
}
