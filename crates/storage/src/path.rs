//! Path validation and object key utilities.
//!
//! Object keys are always POSIX-style (forward slashes) no matter what the
//! host filesystem uses, and must never escape the sync root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a relative path for security and correctness.
/// Ensures that paths don't escape the root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use websync_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("css/site.css").is_ok());
/// assert!(validate_path("a/../index.html").is_ok()); // (never leaves the root)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("wrong/../still-wrong/.././correct//./page.html/").unwrap(),
///     Path::new("correct/page.html")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Turn a path relative to the sync root into an object key.
///
/// Components are joined with `/` regardless of the host separator. Paths
/// that aren't valid UTF-8 can't be represented as keys and are rejected.
///
/// ```
/// use std::path::Path;
/// use websync_storage::object_key;
///
/// let relative = Path::new("sub").join("dir").join("page.html");
/// assert_eq!(object_key(&relative).unwrap(), "sub/dir/page.html");
/// assert!(object_key("../outside.html").is_err());
/// ```
pub fn object_key(relative: impl AsRef<Path>) -> Result<String> {
    let validated = validate(relative.as_ref())?;
    let mut segments = Vec::new();
    for component in validated.components() {
        match component.as_os_str().to_str() {
            Some(segment) => segments.push(segment),
            None => exn::bail!(ErrorKind::InvalidPath(relative.as_ref().to_path_buf())),
        }
    }
    Ok(segments.join("/"))
}

/// Prepend an optional key prefix (a virtual directory inside the bucket).
pub(crate) fn join_prefix(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
        None => key.to_string(),
    }
}

/// Strip an optional key prefix. Returns `None` for keys outside the prefix.
pub(crate) fn strip_prefix<'a>(prefix: Option<&str>, key: &'a str) -> Option<&'a str> {
    match prefix {
        Some(prefix) => key.strip_prefix(prefix.trim_end_matches('/')).and_then(|s| s.strip_prefix('/')),
        None => Some(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate(Path::new("css/site.css")).unwrap(), Path::new("css/site.css"));
        assert_eq!(validate(Path::new("a/b/c/page.html")).unwrap(), Path::new("a/b/c/page.html"));
        assert_eq!(validate(Path::new("index.html")).unwrap(), Path::new("index.html"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(validate(Path::new("a//b//c")).unwrap(), Path::new("a/b/c"));
        assert_eq!(validate(Path::new("a/./b/./c")).unwrap(), Path::new("a/b/c"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate(Path::new("../etc/passwd")).is_err());
        assert!(validate(Path::new("a/../../b")).is_err());
        assert!(validate(Path::new("..")).is_err());
        assert!(validate(Path::new("../..")).is_err());
    }

    #[test]
    fn test_invalid_characters() {
        assert!(validate(Path::new("a\0b")).is_err());
        assert!(validate(Path::new("\0")).is_err());
    }

    #[test]
    fn test_empty_paths() {
        assert!(validate(Path::new("")).is_err());
        assert!(validate(Path::new(".")).is_err());
        assert!(validate(Path::new("./")).is_err());
        assert!(validate(Path::new("//")).is_err());
    }

    #[test]
    fn test_object_key_uses_forward_slashes() {
        let nested: PathBuf = ["sub", "dir", "page.html"].iter().collect();
        assert_eq!(object_key(&nested).unwrap(), "sub/dir/page.html");
        assert_eq!(object_key("index.html").unwrap(), "index.html");
        assert_eq!(object_key("./a//b/").unwrap(), "a/b");
    }

    #[cfg(windows)]
    #[test]
    fn test_object_key_from_backslashes() {
        assert_eq!(object_key(Path::new("sub\\dir\\page.html")).unwrap(), "sub/dir/page.html");
    }

    #[cfg(unix)]
    #[test]
    fn test_object_key_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let path = Path::new(OsStr::from_bytes(b"bad\xff.html"));
        let err = object_key(path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_join_prefix() {
        assert_eq!(join_prefix(None, "css/site.css"), "css/site.css");
        assert_eq!(join_prefix(Some("site"), "css/site.css"), "site/css/site.css");
        assert_eq!(join_prefix(Some("site/"), "css/site.css"), "site/css/site.css");
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix(None, "css/site.css"), Some("css/site.css"));
        assert_eq!(strip_prefix(Some("site"), "site/css/site.css"), Some("css/site.css"));
        assert_eq!(strip_prefix(Some("site/"), "site/css/site.css"), Some("css/site.css"));
        assert_eq!(strip_prefix(Some("site"), "other/index.html"), None);
        // Component boundary, not string prefix.
        assert_eq!(strip_prefix(Some("site"), "sitemap.xml"), None);
    }
}
