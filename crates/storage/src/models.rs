//! Storage models.

use time::OffsetDateTime;

/// Object metadata returned by bucket listings.
///
/// `etag` is kept exactly as the provider reported it (quotes included) so it
/// can be compared against a local fingerprint with plain string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Key relative to the bucket (or its configured prefix)
    pub key: String,
    /// Provider content identity, e.g. `"d41d8cd98f00b204e9800998ecf8427e"`
    pub etag: String,
    /// Object size in bytes
    pub size: u64,
    /// Last modified timestamp, when the provider reports one
    pub modified: Option<OffsetDateTime>,
}
impl ObjectInfo {
    pub fn new(key: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            etag: etag.into(),
            size: 0,
            modified: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_modified(mut self, modified: OffsetDateTime) -> Self {
        self.modified = Some(modified);
        self
    }
}
