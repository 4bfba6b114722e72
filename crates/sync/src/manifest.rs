use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::TryStreamExt;
use std::collections::HashMap;
use websync_storage::Bucket;

/// Remote object keys and their ETags, as listed at the start of a run.
///
/// Keys are removed ("claimed") as the matching local files are found. What
/// is left at the end exists only remotely.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    etags: HashMap<String, String>,
}

impl Manifest {
    /// List every object in `bucket`, following pagination to the end.
    ///
    /// # Errors
    /// Returns [`ErrorKind::Manifest`] raised from the storage error if any
    /// page cannot be fetched. A partial manifest is never returned.
    pub async fn fetch(bucket: &dyn Bucket) -> Result<Self> {
        let mut etags = HashMap::new();
        let mut objects = bucket.list_stream();
        while let Some(object) = objects.try_next().await.or_raise(|| ErrorKind::Manifest)? {
            etags.insert(object.key, object.etag);
        }
        tracing::debug!(bucket = bucket.name(), objects = etags.len(), "Fetched remote manifest");
        Ok(Self { etags })
    }

    /// Remove `key` from the manifest, returning its ETag if it was present.
    pub fn claim(&mut self, key: &str) -> Option<String> {
        self.etags.remove(key)
    }

    pub fn len(&self) -> usize {
        self.etags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.etags.is_empty()
    }

    /// Keys never claimed, sorted.
    pub fn into_remaining(self) -> Vec<String> {
        let mut keys: Vec<String> = self.etags.into_keys().collect();
        keys.sort();
        keys
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            etags: iter.into_iter().map(|(key, etag)| (key.into(), etag.into())).collect(),
        }
    }
}
