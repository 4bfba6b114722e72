//! Local content fingerprints that compare equal to S3 ETags.
//!
//! S3 reports an ETag for every object. For objects uploaded in one request
//! the ETag is the quoted hex MD5 of the content; for multipart uploads it is
//! the MD5 of the concatenated (raw, not hex) part digests followed by the
//! part count: `"<hex>-<parts>"`. Computing the same value locally lets a
//! sync decide whether an object changed without downloading anything.
//!
//! The multipart form depends on the part size used during upload. The
//! [`ChunkSize`] used for fingerprinting **must** be the same value used as
//! the multipart threshold and part size, otherwise byte-identical files will
//! look different (and get re-uploaded once under the new size).
//!
//! ```
//! use websync_fingerprint::{ChunkSize, Fingerprint};
//!
//! let chunk = ChunkSize::new(4).unwrap();
//! assert_eq!(Fingerprint::from_slice(b"", chunk).to_string(), "\"d41d8cd98f00b204e9800998ecf8427e\"");
//! assert_eq!(Fingerprint::from_slice(b"abcd", chunk).parts(), 1);
//! assert!(Fingerprint::from_slice(b"abcde", chunk).to_string().ends_with("-2\""));
//! ```

mod chunk;
pub mod error;
mod ops;

pub use crate::chunk::{ChunkSize, DEFAULT_CHUNK_SIZE};
pub use crate::ops::Hasher;
use std::fmt;

/// Raw MD5 digest of a single part.
pub type PartDigest = [u8; 16];

/// A content fingerprint in the shape S3 uses for ETags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// No bytes were read. Renders as the MD5 of empty input, which is the
    /// ETag S3 reports for an empty object.
    Empty,
    /// Content fit in one chunk: plain MD5.
    Single(PartDigest),
    /// Content spanned several chunks.
    Multipart { digest: PartDigest, parts: usize },
}

impl Fingerprint {
    /// Combine per-chunk digests (in chunk order) into a fingerprint.
    ///
    /// Order matters: the combined digest is taken over the concatenation of
    /// the part digests, so reordering parts yields a different fingerprint.
    #[must_use]
    pub fn from_part_digests(digests: &[PartDigest]) -> Self {
        match digests {
            [] => Self::Empty,
            [single] => Self::Single(*single),
            parts => {
                let mut context = md5::Context::new();
                for digest in parts {
                    context.consume(digest);
                }
                Self::Multipart {
                    digest: context.compute().0,
                    parts: parts.len(),
                }
            },
        }
    }

    /// Number of chunks the fingerprint was computed from.
    #[must_use]
    pub fn parts(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Multipart { parts, .. } => *parts,
        }
    }

    /// Exact comparison against a provider-reported ETag (quotes included).
    #[must_use]
    pub fn matches(&self, etag: &str) -> bool {
        self.to_string() == etag
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "\"{:x}\"", md5::compute(b"")),
            Self::Single(digest) => write!(f, "\"{:x}\"", md5::Digest(*digest)),
            Self::Multipart { digest, parts } => write!(f, "\"{:x}-{parts}\"", md5::Digest(*digest)),
        }
    }
}
