use crate::error::{ErrorKind, Result};
use crate::{ChunkSize, Fingerprint, PartDigest};
use std::io::{self, Read};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Read buffer size. Independent of the chunk size: chunk boundaries are
/// tracked by [`Hasher`], not by how much each read returns.
const READ_BUFFER: usize = 64 * 1024;

/// Incremental fingerprint calculation.
///
/// Feed bytes in any slicing; parts are cut at exact multiples of the chunk
/// size regardless of how the input was split. Short reads therefore never
/// shift part boundaries.
#[derive(Clone)]
pub struct Hasher {
    chunk_size: usize,
    current: Option<md5::Context>,
    in_chunk: usize,
    digests: Vec<PartDigest>,
}

impl Hasher {
    #[must_use]
    pub fn new(chunk_size: ChunkSize) -> Self {
        Self {
            chunk_size: chunk_size.get(),
            current: None,
            in_chunk: 0,
            digests: Vec::new(),
        }
    }

    pub fn update(&mut self, mut data: &[u8]) -> &mut Self {
        while !data.is_empty() {
            let take = (self.chunk_size - self.in_chunk).min(data.len());
            let (head, tail) = data.split_at(take);
            self.current.get_or_insert_with(md5::Context::new).consume(head);
            self.in_chunk += take;
            data = tail;
            if self.in_chunk == self.chunk_size {
                self.close_chunk();
            }
        }
        self
    }

    fn close_chunk(&mut self) {
        if let Some(context) = self.current.take() {
            self.digests.push(context.compute().0);
        }
        self.in_chunk = 0;
    }

    #[must_use]
    pub fn finalize(mut self) -> Fingerprint {
        self.close_chunk();
        Fingerprint::from_part_digests(&self.digests)
    }
}

impl Fingerprint {
    /// Fingerprint an in-memory buffer.
    #[must_use]
    pub fn from_slice(data: &[u8], chunk_size: ChunkSize) -> Self {
        let mut hasher = Hasher::new(chunk_size);
        hasher.update(data);
        hasher.finalize()
    }

    /// Fingerprint everything a blocking reader yields until EOF.
    pub fn from_reader<R: Read>(mut reader: R, chunk_size: ChunkSize) -> Result<Self> {
        let mut hasher = Hasher::new(chunk_size);
        let mut buffer = vec![0u8; READ_BUFFER];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => exn::bail!(ErrorKind::Io(e)),
            }
        }
        Ok(hasher.finalize())
    }

    /// Fingerprint a file on disk.
    ///
    /// A file that can't be opened or read (missing, permissions, vanished
    /// halfway through) is an error; an empty file is [`Fingerprint::Empty`].
    pub async fn from_path(path: impl AsRef<Path>, chunk_size: ChunkSize) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        let mut hasher = Hasher::new(chunk_size);
        let mut buffer = vec![0u8; READ_BUFFER];
        loop {
            let read = file.read(&mut buffer).await.map_err(|e| ErrorKind::from_io(e, path))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        let fingerprint = hasher.finalize();
        tracing::trace!(path = %path.display(), %fingerprint, "Calculated fingerprint");
        Ok(fingerprint)
    }
}
