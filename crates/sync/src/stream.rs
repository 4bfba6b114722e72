use crate::error::{ErrorKind, Result};
use crate::file::{Action, sync_file};
use crate::manifest::Manifest;
use crate::walk::walk;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use std::path::{Path, PathBuf};
use websync_storage::BucketHandle;

/// Progress events emitted by [`sync`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`ManifestLoaded`](Self::ManifestLoaded) exactly once, with the number
///    of remote objects.
/// 3. [`Synced`](Self::Synced) zero or more times, one per local file.
/// 4. [`Reconciled`](Self::Reconciled) at most once, with the keys removed.
/// 5. [`Complete`](Self::Complete) exactly once.
///
/// A fatal error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    ManifestLoaded(usize),
    Synced(Action),
    Reconciled(Vec<String>),
    Complete,
}

/// Streams [`SyncEvent`]s while making `bucket` mirror the directory `root`.
///
/// Files are handled one at a time, in walk order. Per-file failures are
/// yielded as `Err` items without terminating the stream; their keys still
/// count as present locally, so their remote copies are never deleted. Only
/// [fatal](ErrorKind::is_fatal) errors end the stream.
pub fn sync<'a>(bucket: &'a BucketHandle, root: &'a Path) -> impl Stream<Item = Result<SyncEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(SyncEvent::Started);

        // Checked before touching the bucket: a typo in the local path must
        // not turn into "delete everything".
        let root = match canonical_root(root).await {
            Ok(root) => root,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let mut manifest = match Manifest::fetch(bucket.as_ref()).await {
            Ok(manifest) => manifest,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(SyncEvent::ManifestLoaded(manifest.len()));

        let mut incomplete = false;
        for await file in walk(&root) {
            let file = match file {
                Ok(file) => file,
                Err(e) => {
                    incomplete |= matches!(&*e, ErrorKind::Walk(_));
                    yield Err(e);
                    continue;
                },
            };
            let remote_etag = manifest.claim(&file.key);
            yield sync_file(bucket.as_ref(), &file, remote_etag.as_deref()).await.map(SyncEvent::Synced);
        }

        if incomplete {
            tracing::warn!(bucket = bucket.name(), stale = manifest.len(), "Not removing stale objects after an incomplete walk");
            yield Err(exn::Exn::from(ErrorKind::IncompleteWalk));
        } else {
            let stale = manifest.into_remaining();
            if stale.is_empty() {
                yield Ok(SyncEvent::Reconciled(stale));
            } else {
                tracing::debug!(bucket = bucket.name(), stale = stale.len(), "Removing stale objects");
                yield bucket.delete_many(&stale).await.or_raise(|| ErrorKind::Reconcile).map(SyncEvent::Reconciled);
            }
        }

        yield Ok(SyncEvent::Complete);
    })
}

async fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = tokio::fs::canonicalize(root).await.or_raise(|| ErrorKind::InvalidRoot(root.to_path_buf()))?;
    let metadata = tokio::fs::metadata(&canonical).await.or_raise(|| ErrorKind::InvalidRoot(root.to_path_buf()))?;
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::InvalidRoot(root.to_path_buf()));
    }
    Ok(canonical)
}
