//! websync: publish a static website directory to an S3 bucket.

mod cli;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::{StreamExt, TryStreamExt};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use websync_config::Config;
use websync_storage::backend::{Bucket, DryRunBucket, S3Backend};
use websync_storage::BucketHandle;
use websync_sync::{Action, SyncEvent};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .or_raise(|| ErrorKind::Runtime)
        .and_then(|runtime| runtime.block_on(run(cli)));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins over the `-v`/`-q` flags when set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Sync { path, bucket } => sync_command(&config, &path, &bucket, cli.dry_run).await,
        Command::ListObjects { bucket } => list_command(&config, &bucket).await,
    }
}

fn connect(config: &Config, bucket: &str) -> Result<Arc<S3Backend>> {
    let chunk_size = config.chunk_size().or_raise(|| ErrorKind::Config)?;
    let (key_id, key_secret) = config.credentials().or_raise(|| ErrorKind::Config)?;
    let backend = S3Backend::new(
        bucket,
        config.s3.prefix.clone(),
        config.s3.region.clone(),
        config.s3.endpoint.clone(),
        key_id,
        key_secret,
        chunk_size,
    )
    .or_raise(|| ErrorKind::Storage)?;
    Ok(Arc::new(backend))
}

async fn sync_command(config: &Config, path: &Path, bucket: &str, dry_run: bool) -> Result<()> {
    let s3 = connect(config, bucket)?;
    let handle: BucketHandle = if dry_run {
        println!("Dry run: nothing will be uploaded or removed");
        Arc::new(DryRunBucket::new(s3.clone()))
    } else {
        s3.clone()
    };

    let mut failures = 0usize;
    let mut events = std::pin::pin!(websync_sync::sync(&handle, path));
    while let Some(event) = events.next().await {
        match event {
            Ok(SyncEvent::Synced(Action::Uploaded(key))) => println!("Uploading {key}"),
            Ok(SyncEvent::Synced(Action::Skipped(key))) => println!("Skipping {key}"),
            Ok(SyncEvent::Reconciled(deleted)) => deleted.iter().for_each(|key| println!("Removing {key}")),
            Ok(SyncEvent::ManifestLoaded(count)) => tracing::info!(bucket, objects = count, "Loaded remote manifest"),
            Ok(SyncEvent::Started | SyncEvent::Complete) => {},
            Err(e) if e.is_fatal() => return Err(e).or_raise(|| ErrorKind::Sync),
            Err(e) => {
                failures += 1;
                eprintln!("warning: {e:?}");
            },
        }
    }
    if failures > 0 {
        eprintln!("{failures} step(s) failed; rerun to retry them");
    }

    match s3.website_url().await {
        Ok(Some(url)) => println!("Static website URL: {url}"),
        Ok(None) => {},
        Err(e) => tracing::warn!(bucket, error = %e, "Could not determine the website URL"),
    }
    Ok(())
}

async fn list_command(config: &Config, bucket: &str) -> Result<()> {
    let s3 = connect(config, bucket)?;
    let mut objects = s3.list_stream();
    while let Some(object) = objects.try_next().await.or_raise(|| ErrorKind::Storage)? {
        println!("{}\t{}", object.key, object.etag);
    }
    Ok(())
}
