use crate::error::{Error, Result};
use crate::file::Action;
use crate::stream::{SyncEvent, sync};
use futures::StreamExt;
use std::path::Path;
use websync_storage::BucketHandle;

/// Everything a finished [`sync`] did, in the order it happened.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
    pub deleted: Vec<String>,
    /// Non-fatal failures; the run carried on past each of these.
    pub failures: Vec<Error>,
}

impl SyncReport {
    /// `true` when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Synced(Action::Uploaded(key)) => self.uploaded.push(key),
            SyncEvent::Synced(Action::Skipped(key)) => self.skipped.push(key),
            SyncEvent::Reconciled(deleted) => self.deleted.extend(deleted),
            SyncEvent::Started | SyncEvent::ManifestLoaded(_) | SyncEvent::Complete => {},
        }
    }
}

/// Drive [`sync`] to completion and collect a [`SyncReport`].
///
/// # Errors
/// Returns the first [fatal](crate::error::ErrorKind::is_fatal) error. Every
/// other error is logged and collected into [`SyncReport::failures`].
pub async fn sync_all(bucket: &BucketHandle, root: &Path) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    let events = sync(bucket, root);
    futures::pin_mut!(events);
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => report.record(event),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(bucket = bucket.name(), error = %e, "Sync step failed");
                report.failures.push(e);
            },
        }
    }
    tracing::info!(
        bucket = bucket.name(),
        uploaded = report.uploaded.len(),
        skipped = report.skipped.len(),
        deleted = report.deleted.len(),
        failed = report.failures.len(),
        "Sync finished"
    );
    Ok(report)
}
