//! In-memory bucket for testing.

use super::ObjectInfoStream;
use crate::backend::Bucket;
use crate::error::{ErrorKind, Result};
use crate::models::ObjectInfo;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use websync_fingerprint::{ChunkSize, Fingerprint};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockObject {
    pub data: Vec<u8>,
    pub etag: String,
    pub content_type: String,
    pub modified: OffsetDateTime,
}

/// In-memory bucket for testing.
///
/// Objects live in a `HashMap` behind a [`RwLock`], so all trait methods can
/// operate on `&self`. ETags are computed with the same fingerprint scheme S3
/// uses, at the bucket's chunk size, so a sync against this bucket behaves
/// like a sync against the real thing.
///
/// Failures can be injected per key (uploads) or per operation (listing,
/// deletes) to exercise error handling.
///
/// # Examples
///
/// ```
/// use websync_storage::backend::{Bucket, MockBucket};
/// use websync_storage::ChunkSize;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bucket = MockBucket::with_objects(ChunkSize::default(), [
///     ("index.html", b"<html>...</html>".to_vec()),
/// ]);
/// let listing = bucket.list().await.unwrap();
/// assert_eq!(listing[0].key, "index.html");
/// assert!(listing[0].etag.starts_with('"'));
/// # Ok(())
/// # }
/// ```
pub struct MockBucket {
    name: String,
    chunk_size: ChunkSize,
    objects: RwLock<HashMap<String, MockObject>>,
    failing_uploads: HashSet<String>,
    fail_listing: bool,
    fail_deletes: bool,
}

impl MockBucket {
    /// Create a mock bucket pre-populated with objects.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_objects(
        chunk_size: ChunkSize,
        objects: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut map = HashMap::new();
        for (key, data) in objects {
            let key = Self::checked_key(key.into());
            let data = data.into();
            let etag = Fingerprint::from_slice(&data, chunk_size).to_string();
            map.insert(key.clone(), Self::stored(data, etag, crate::content_type::from_key(&key)));
        }
        Self {
            name: "mock".to_string(),
            chunk_size,
            objects: RwLock::new(map),
            failing_uploads: HashSet::new(),
            fail_listing: false,
            fail_deletes: false,
        }
    }

    /// Create a mock bucket whose listing reports the given ETags verbatim
    /// (object contents are empty).
    pub fn with_etags(
        chunk_size: ChunkSize,
        etags: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut bucket = Self::with_objects(chunk_size, std::iter::empty::<(String, Vec<u8>)>());
        let map = bucket.objects.get_mut();
        for (key, etag) in etags {
            let key = Self::checked_key(key.into());
            map.insert(key.clone(), Self::stored(Vec::new(), etag.into(), crate::content_type::from_key(&key)));
        }
        bucket
    }

    /// Change the name of the mock bucket.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every upload of `key` fail with a network error.
    pub fn with_failing_upload(mut self, key: impl Into<String>) -> Self {
        self.failing_uploads.insert(key.into());
        self
    }

    /// Make listing fail with a permission error.
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make bulk deletes fail.
    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Snapshot of a stored object.
    pub async fn object(&self, key: &str) -> Option<MockObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn checked_key(key: String) -> String {
        match crate::object_key(&key) {
            Ok(normalized) if normalized == key => key,
            // The panic here is DELIBERATE. MockBucket is intended to be used
            // in tests; panics are expected. There is no error result.
            _ => panic!("MockBucket: invalid key {key}"),
        }
    }

    fn stored(data: Vec<u8>, etag: String, content_type: &str) -> MockObject {
        MockObject {
            data,
            etag,
            content_type: content_type.to_string(),
            modified: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
impl Bucket for MockBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    fn list_stream(&self) -> ObjectInfoStream<'_> {
        if self.fail_listing {
            let err = exn::Exn::from(ErrorKind::PermissionDenied(self.name.clone()));
            return Box::pin(futures::stream::once(async { Err(err) }));
        }
        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding to
            // avoid holding the lock across yield points.
            let mut entries: Vec<ObjectInfo> = {
                let guard = self.objects.read().await;
                guard
                    .iter()
                    .map(|(key, object)| {
                        ObjectInfo::new(key.clone(), object.etag.clone())
                            .with_size(object.data.len() as u64)
                            .with_modified(object.modified)
                    })
                    .collect()
            };
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            for entry in entries {
                yield Ok(entry);
            }
        })
    }

    async fn upload(&self, key: &str, source: &Path, content_type: &str) -> Result<()> {
        let key = crate::object_key(key)?;
        if self.failing_uploads.contains(&key) {
            exn::bail!(ErrorKind::Network(format!("injected upload failure for {key}")));
        }
        let data = tokio::fs::read(source).await.map_err(|e| ErrorKind::from_io(e, source))?;
        let etag = Fingerprint::from_slice(&data, self.chunk_size).to_string();
        self.objects.write().await.insert(key, Self::stored(data, etag, content_type));
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        if self.fail_deletes {
            exn::bail!(ErrorKind::BackendError("injected delete failure".to_string()));
        }
        let mut guard = self.objects.write().await;
        for key in keys {
            guard.remove(key);
        }
        Ok(keys.to_vec())
    }
}
