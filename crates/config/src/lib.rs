//! Layered configuration for websync.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults.
//! 2. A config file: the path given on the command line, or `config.toml` in
//!    the platform config directory. The format follows the extension
//!    (`.toml`, `.yaml`/`.yml`, `.json`).
//! 3. The standard `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
//!    `AWS_REGION` variables.
//! 4. `WEBSYNC_`-prefixed variables, with `__` separating nested keys
//!    (`WEBSYNC_S3__PREFIX=site`).
//!
//! ```toml
//! chunk_size = 8388608
//!
//! [s3]
//! region = "eu-central-1"
//! key_id = "AKIA..."
//! key_secret = "..."
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use websync_fingerprint::{ChunkSize, DEFAULT_CHUNK_SIZE};

/// Name of the config file looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "WEBSYNC_";
/// Standard AWS variables, and where they land in [`Config`].
const AWS_ENV: &[(&str, &str)] = &[
    ("AWS_ACCESS_KEY_ID", "s3.key_id"),
    ("AWS_SECRET_ACCESS_KEY", "s3.key_secret"),
    ("AWS_REGION", "s3.region"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Multipart threshold and part size in bytes; also the chunk size used
    /// for local fingerprints.
    pub chunk_size: u64,
    pub s3: S3Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub region: String,
    /// Custom endpoint for S3-compatible services. AWS is used when unset.
    pub endpoint: Option<String>,
    /// Key prefix inside the bucket.
    pub prefix: Option<String>,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE as u64,
            s3: S3Config::default(),
        }
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            prefix: None,
            key_id: None,
            key_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from every source.
    ///
    /// An `explicit` path must exist. Without one, the platform config file
    /// is used if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(Some(path)),
            None => Self::from_file(Self::default_path().filter(|path| path.is_file()).as_deref()),
        }
    }

    /// Load configuration from defaults, an optional file and the environment.
    pub fn from_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "Loading config file");
        }
        Self::figment(file).extract().map_err(|e| ErrorKind::Load(e.to_string()).into())
    }

    /// `config.toml` in the platform config directory, e.g.
    /// `~/.config/websync/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "websync").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        let aws = Env::raw().filter_map(|var| {
            AWS_ENV.iter().find(|(name, _)| var == *name).map(|(_, key)| (*key).into())
        });
        figment.merge(aws).merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// The configured chunk size.
    ///
    /// # Errors
    /// [`ErrorKind::InvalidChunkSize`] for zero, or for a value that doesn't
    /// fit in `usize`.
    pub fn chunk_size(&self) -> Result<ChunkSize> {
        usize::try_from(self.chunk_size)
            .ok()
            .and_then(ChunkSize::new)
            .ok_or_else(|| ErrorKind::InvalidChunkSize(self.chunk_size).into())
    }

    /// Access key id and secret.
    ///
    /// # Errors
    /// [`ErrorKind::MissingCredentials`] unless both are set and non-empty.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.s3.key_id.as_deref(), self.s3.key_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => exn::bail!(ErrorKind::MissingCredentials),
        }
    }
}
