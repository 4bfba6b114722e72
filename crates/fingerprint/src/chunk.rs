use std::fmt;
use std::num::NonZeroUsize;

/// 8 MiB. Matches the default multipart threshold and part size used by the
/// AWS CLI and boto3, so fingerprints line up with objects they uploaded.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Byte size of one fingerprint chunk, which is also the multipart upload
/// threshold and part size.
///
/// There is exactly one of these per run: the bucket owns it and the sync
/// engine reads it back from the bucket, so fingerprinting and uploading
/// cannot drift apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    /// Returns `None` for zero.
    #[must_use]
    pub const fn new(bytes: usize) -> Option<Self> {
        match NonZeroUsize::new(bytes) {
            Some(bytes) => Some(Self(bytes)),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Number of chunks needed for `len` bytes (zero for an empty file).
    #[must_use]
    pub fn parts_for(self, len: u64) -> u64 {
        // Infallible on every supported target: usize is at most 64 bits.
        let size = u64::try_from(self.get()).unwrap_or(u64::MAX);
        len.div_ceil(size)
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}
