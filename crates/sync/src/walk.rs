//! Local directory traversal.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

/// A regular file found under the sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Object key: the path relative to the root, `/`-separated
    pub key: String,
}

enum WalkEntry {
    File(LocalFile),
    /// Logical path to descend into, and the directory it resolves to.
    Descend(PathBuf, PathBuf),
    Skip,
}

/// A directory waiting to be read.
struct PendingDir {
    path: PathBuf,
    /// Canonical paths from the root down to and including this directory.
    ancestors: Vec<PathBuf>,
}

/// Stream every regular file below `root`.
///
/// The traversal is iterative (an explicit stack of directories), so deep
/// trees cannot overflow the call stack. Entries within a directory are
/// visited in name order.
///
/// Symlinks are followed and published under their own path below the root,
/// wherever their target lives. A directory link that resolves to one of its
/// own ancestors is not descended, which stops link loops. Broken links and
/// special files are skipped.
///
/// A directory or entry that cannot be read yields an [`ErrorKind::Walk`]
/// item and the walk carries on with the rest of the tree.
pub fn walk(root: &Path) -> impl Stream<Item = Result<LocalFile>> + '_ {
    stream! {
        // An unresolvable root fails below, on read_dir.
        let canonical = fs::canonicalize(root).await.unwrap_or_else(|_| root.to_path_buf());
        let mut stack = vec![PendingDir { path: root.to_path_buf(), ancestors: vec![canonical] }];
        while let Some(current) = stack.pop() {
            let entries = match read_sorted(&current.path).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(e);
                    continue;
                },
            };
            let mut subdirectories = Vec::new();
            for entry in entries {
                match process_entry(root, entry, &current.ancestors).await {
                    Ok(WalkEntry::File(file)) => yield Ok(file),
                    Ok(WalkEntry::Descend(path, canonical)) => {
                        let mut ancestors = current.ancestors.clone();
                        ancestors.push(canonical);
                        subdirectories.push(PendingDir { path, ancestors });
                    },
                    Ok(WalkEntry::Skip) => {},
                    Err(e) => yield Err(e),
                }
            }
            // Reversed so the first subdirectory is popped first.
            stack.extend(subdirectories.into_iter().rev());
        }
    }
}

async fn read_sorted(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut reader = fs::read_dir(dir).await.or_raise(|| ErrorKind::Walk(dir.to_path_buf()))?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.or_raise(|| ErrorKind::Walk(dir.to_path_buf()))? {
        entries.push(entry);
    }
    entries.sort_by_key(DirEntry::file_name);
    Ok(entries)
}

/// `ancestors` ends with the canonical path of the directory holding `entry`.
async fn process_entry(root: &Path, entry: DirEntry, ancestors: &[PathBuf]) -> Result<WalkEntry> {
    let path = entry.path();
    // `DirEntry::file_type` does not follow symlinks.
    let mut file_type = entry.file_type().await.or_raise(|| ErrorKind::Walk(path.clone()))?;
    let is_link = file_type.is_symlink();
    if is_link {
        match fs::metadata(&path).await {
            Ok(target) => file_type = target.file_type(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping broken symlink");
                return Ok(WalkEntry::Skip);
            },
        }
    }
    if file_type.is_dir() {
        let canonical = match ancestors.last() {
            Some(parent) if !is_link => parent.join(entry.file_name()),
            _ => fs::canonicalize(&path).await.or_raise(|| ErrorKind::Walk(path.clone()))?,
        };
        if ancestors.contains(&canonical) {
            tracing::warn!(path = %path.display(), target = %canonical.display(), "Skipping symlink loop");
            return Ok(WalkEntry::Skip);
        }
        return Ok(WalkEntry::Descend(path, canonical));
    }
    if !file_type.is_file() {
        tracing::debug!(path = %path.display(), "Skipping non-regular file");
        return Ok(WalkEntry::Skip);
    }
    // Keyed by where the entry sits under the root, not where a link points.
    let key = path
        .strip_prefix(root)
        .ok()
        .and_then(|relative| websync_storage::object_key(relative).ok())
        .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidKey(path.clone())))?;
    Ok(WalkEntry::File(LocalFile { path, key }))
}
