use crate::LocalFile;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use websync_fingerprint::Fingerprint;
use websync_storage::Bucket;

/// The outcome of (successfully) syncing a single file.
///
/// Both variants carry the object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The local content differed from (or was missing in) the bucket and
    /// has been uploaded.
    Uploaded(String),
    /// The bucket already holds identical content; nothing was sent.
    Skipped(String),
}

impl Action {
    pub fn key(&self) -> &str {
        match self {
            Self::Uploaded(key) | Self::Skipped(key) => key,
        }
    }
}

/// Bring one object in line with a local file.
///
/// The file is fingerprinted with the bucket's chunk size and compared with
/// `remote_etag` (the manifest entry for the same key, if any). Exact string
/// equality means the file is [`Action::Skipped`]; otherwise it is uploaded
/// with the bucket's content type for its key.
///
/// # Errors
/// - [`ErrorKind::Fingerprint`] if the file can't be read.
/// - [`ErrorKind::Upload`] if the bucket rejects the upload.
pub async fn sync_file(bucket: &dyn Bucket, file: &LocalFile, remote_etag: Option<&str>) -> Result<Action> {
    let fingerprint = Fingerprint::from_path(&file.path, bucket.chunk_size())
        .await
        .or_raise(|| ErrorKind::Fingerprint(file.key.clone()))?;
    if remote_etag.is_some_and(|etag| fingerprint.matches(etag)) {
        tracing::debug!(key = file.key, etag = %fingerprint, "Unchanged");
        return Ok(Action::Skipped(file.key.clone()));
    }

    let content_type = bucket.content_type(&file.key);
    tracing::debug!(key = file.key, local = %fingerprint, remote = remote_etag, content_type, "Uploading");
    bucket
        .upload(&file.key, &file.path, content_type)
        .await
        .or_raise(|| ErrorKind::Upload(file.key.clone()))?;
    Ok(Action::Uploaded(file.key.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use websync_storage::ChunkSize;
    use websync_storage::backend::MockBucket;

    fn chunk() -> ChunkSize {
        ChunkSize::new(4).unwrap()
    }

    fn local(dir: &tempfile::TempDir, key: &str, data: &[u8]) -> LocalFile {
        let path = dir.path().join(key);
        std::fs::write(&path, data).unwrap();
        LocalFile { path, key: key.to_string() }
    }

    #[tokio::test]
    async fn test_matching_etag_skips() {
        let dir = tempfile::tempdir().unwrap();
        let file = local(&dir, "a.html", b"hello world");
        let etag = Fingerprint::from_slice(b"hello world", chunk()).to_string();
        let bucket = MockBucket::with_etags(chunk(), [("a.html", etag.clone())]);

        let action = sync_file(&bucket, &file, Some(&etag)).await.unwrap();
        assert_eq!(action, Action::Skipped("a.html".to_string()));
        // Nothing was written over the listed object.
        assert!(bucket.object("a.html").await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_changed_or_new_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let file = local(&dir, "a.html", b"new content");
        let bucket = MockBucket::with_etags(chunk(), std::iter::empty::<(String, String)>());

        assert_eq!(sync_file(&bucket, &file, Some("\"stale\"")).await.unwrap().key(), "a.html");
        assert_eq!(sync_file(&bucket, &file, None).await.unwrap(), Action::Uploaded("a.html".to_string()));
        let object = bucket.object("a.html").await.unwrap();
        assert_eq!(object.data, b"new content");
        assert_eq!(object.content_type, "text/html");
    }

    #[tokio::test]
    async fn test_chunk_size_comes_from_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let file = local(&dir, "big.bin", b"0123456789");
        // Same content, fingerprinted at a different chunk size: not a match.
        let other = Fingerprint::from_slice(b"0123456789", ChunkSize::new(8).unwrap()).to_string();
        let bucket = MockBucket::with_etags(chunk(), std::iter::empty::<(String, String)>());
        assert!(matches!(sync_file(&bucket, &file, Some(&other)).await.unwrap(), Action::Uploaded(_)));
        let ours = Fingerprint::from_slice(b"0123456789", chunk()).to_string();
        assert!(matches!(sync_file(&bucket, &file, Some(&ours)).await.unwrap(), Action::Skipped(_)));
    }

    #[tokio::test]
    async fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = MockBucket::with_etags(chunk(), std::iter::empty::<(String, String)>()).with_failing_upload("a.html");

        let missing = LocalFile { path: dir.path().join("gone.html"), key: "gone.html".to_string() };
        let err = sync_file(&bucket, &missing, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Fingerprint(key) if key == "gone.html"));

        let file = local(&dir, "a.html", b"a");
        let err = sync_file(&bucket, &file, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Upload(key) if key == "a.html"));
    }
}
