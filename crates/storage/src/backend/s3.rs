//! S3-compatible bucket.
//!
//! This module provides a [`Bucket`] implementation for AWS S3 and
//! S3-compatible services (MinIO, Backblaze B2, Tigris, ...).
//!
//! # Credentials
//!
//! Credentials are provided explicitly (from configuration). There is no
//! credential chain or profile lookup.
//!
//! # ETags
//!
//! Objects no larger than the chunk size are sent with a single `PutObject`
//! (ETag = MD5 of the content). Anything larger goes through a multipart
//! upload with part size = chunk size (ETag = MD5 of part MD5s + part count).
//! That is exactly the scheme [`websync_fingerprint::Fingerprint`] computes,
//! so re-running a sync against unchanged files transfers nothing.

use crate::{
    backend::{Bucket, ObjectInfoStream},
    error::{ErrorKind, Result},
    models::ObjectInfo,
    object_key,
    path::{join_prefix, strip_prefix},
};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::{ByteStream, DateTime},
    types::{CompletedMultipartUpload, CompletedPart, Delete, Object, ObjectIdentifier},
};
use exn::{OptionExt, ResultExt};
use std::collections::HashSet;
use std::path::Path;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use websync_fingerprint::ChunkSize;

/// Smallest part S3 accepts in a multipart upload (except the last part).
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;
/// Largest part S3 accepts in a multipart upload.
pub const MAX_PART_SIZE: usize = 5 * 1024 * 1024 * 1024;
/// Most parts a single multipart upload may have.
const MAX_PARTS: u64 = 10_000;
/// Most keys a single `DeleteObjects` request may carry.
const MAX_DELETE_BATCH: usize = 1000;

/// Regions that only serve the legacy `s3-website-<region>` (dash) form.
const DASH_WEBSITE_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "eu-west-1",
    "sa-east-1",
    "us-gov-west-1",
];

/// S3-compatible bucket.
///
/// Stores objects in an S3 bucket, optionally under a key prefix. All keys
/// are relative to the configured prefix (if any).
///
/// # Examples
///
/// ```no_run
/// use websync_storage::{ChunkSize, backend::S3Backend};
///
/// # fn example() {
/// let bucket = S3Backend::new(
///     "example.com",
///     None,
///     "eu-central-1",
///     None::<String>,
///     "access_key_id",
///     "secret_access_key",
///     ChunkSize::default(),
/// ).unwrap();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    chunk_size: ChunkSize,
    /// Website URLs only make sense for AWS itself.
    custom_endpoint: bool,
}

impl S3Backend {
    /// Create a new S3 bucket client.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Optional key prefix (acts as virtual directory)
    /// * `region` - AWS region or provider-specific region
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - Access key ID
    /// * `key_secret` - Secret access key
    /// * `chunk_size` - Multipart threshold and part size
    pub fn new(
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        chunk_size: ChunkSize,
    ) -> Result<Self> {
        let credentials = Credentials::new(key_id, key_secret, None, None, "websync-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // Configure retry policy with exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4));
        let custom_endpoint = endpoint.is_some();
        if let Some(endpoint_url) = endpoint {
            // Path-style addressing for better compatibility with
            // S3-compatible services (MinIO, Backblaze, etc.)
            config_builder = config_builder.endpoint_url(endpoint_url).force_path_style(true);
        }
        let client = Client::from_conf(config_builder.build());
        Self::with_client(client, bucket, prefix, chunk_size, custom_endpoint)
    }

    fn with_client(
        client: Client,
        bucket: impl Into<String>,
        prefix: Option<String>,
        chunk_size: ChunkSize,
        custom_endpoint: bool,
    ) -> Result<Self> {
        if !(MIN_PART_SIZE..=MAX_PART_SIZE).contains(&chunk_size.get()) {
            exn::bail!(ErrorKind::InvalidChunkSize(chunk_size.get()));
        }
        let prefix = prefix.map(object_key).transpose()?;
        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix,
            chunk_size,
            custom_endpoint,
        })
    }

    /// Construct the full S3 key from a relative local path (upload side).
    fn full_key(&self, key: &str) -> Result<String> {
        Ok(join_prefix(self.prefix.as_deref(), &object_key(key)?))
    }

    /// Full S3 key of an object key reported by [`list_stream()`](Bucket::list_stream).
    ///
    /// Unlike [`full_key()`](Self::full_key) the key is not validated or
    /// normalized; it already names an existing object.
    fn listed_key(&self, key: &str) -> String {
        join_prefix(self.prefix.as_deref(), key)
    }

    /// Convert AWS DateTime to OffsetDateTime.
    fn parse_datetime(dt: &DateTime) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(dt.as_nanos())
            .or_raise(|| ErrorKind::BackendError("S3 datetime out of range".to_string()))
    }

    /// Map a listed object to [`ObjectInfo`], skipping keys outside the prefix.
    fn object_info(&self, object: &Object) -> Result<Option<ObjectInfo>> {
        let Some(key) = object.key() else {
            return Ok(None);
        };
        let Some(relative) = strip_prefix(self.prefix.as_deref(), key) else {
            return Ok(None);
        };
        let mut info = ObjectInfo::new(relative, object.e_tag().unwrap_or_default())
            .with_size(object.size().and_then(|size| u64::try_from(size).ok()).unwrap_or(0));
        if let Some(modified) = object.last_modified() {
            info = info.with_modified(Self::parse_datetime(modified)?);
        }
        Ok(Some(info))
    }

    async fn put_object(&self, key: &str, source: &Path, content_type: &str) -> Result<()> {
        // Bounded by the chunk size: only called for files that fit in one part.
        let data = tokio::fs::read(source).await.map_err(|e| ErrorKind::from_io(e, source))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify(e, &self.bucket))?;
        Ok(())
    }

    async fn multipart_upload(&self, key: &str, source: &Path, content_type: &str, len: u64) -> Result<()> {
        if self.chunk_size.parts_for(len) > MAX_PARTS {
            exn::bail!(ErrorKind::InvalidChunkSize(self.chunk_size.get()));
        }
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(e, &self.bucket))?;
        let upload_id = created
            .upload_id()
            .ok_or_raise(|| ErrorKind::BackendError("multipart upload has no upload id".to_string()))?
            .to_string();

        let parts = match self.upload_parts(key, &upload_id, source).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort_multipart(key, &upload_id).await;
                return Err(e);
            },
        };
        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
            .send()
            .await;
        if let Err(e) = completed {
            self.abort_multipart(key, &upload_id).await;
            return Err(exn::Exn::from(classify(e, &self.bucket)));
        }
        Ok(())
    }

    async fn upload_parts(&self, key: &str, upload_id: &str, source: &Path) -> Result<Vec<CompletedPart>> {
        let mut file = tokio::fs::File::open(source).await.map_err(|e| ErrorKind::from_io(e, source))?;
        let part_size = self.chunk_size.get();
        let mut parts = Vec::new();
        for part_number in 1.. {
            let mut buffer = Vec::with_capacity(part_size);
            // Exactly one chunk per part (short reads included) so the
            // resulting ETag lines up with the local fingerprint.
            (&mut file)
                .take(part_size as u64)
                .read_to_end(&mut buffer)
                .await
                .map_err(|e| ErrorKind::from_io(e, source))?;
            if buffer.is_empty() {
                break;
            }
            let uploaded = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(buffer))
                .send()
                .await
                .map_err(|e| classify(e, &self.bucket))?;
            tracing::trace!(key, part_number, "Uploaded part");
            parts.push(CompletedPart::builder().set_e_tag(uploaded.e_tag().map(str::to_string)).part_number(part_number).build());
        }
        Ok(parts)
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) {
        let aborted =
            self.client.abort_multipart_upload().bucket(&self.bucket).key(key).upload_id(upload_id).send().await;
        if let Err(e) = aborted {
            tracing::warn!(bucket = %self.bucket, key, upload_id, error = %DisplayErrorContext(&e), "Could not abort multipart upload");
        }
    }

    /// The region the bucket lives in.
    ///
    /// S3 reports no location constraint for `us-east-1`, and the legacy
    /// `EU` constraint for `eu-west-1`.
    pub async fn region(&self) -> Result<String> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| classify(e, &self.bucket))?;
        Ok(match output.location_constraint().map(|constraint| constraint.as_str()) {
            None | Some("") => "us-east-1".to_string(),
            Some("EU") => "eu-west-1".to_string(),
            Some(region) => region.to_string(),
        })
    }

    /// Static website URL for the bucket, or `None` when talking to a
    /// non-AWS endpoint.
    pub async fn website_url(&self) -> Result<Option<String>> {
        if self.custom_endpoint {
            return Ok(None);
        }
        let region = self.region().await?;
        Ok(Some(format!("http://{}.{}", self.bucket, website_endpoint(&region))))
    }
}

/// S3 static website hosting endpoint for a region.
///
/// ```
/// use websync_storage::backend::website_endpoint;
///
/// assert_eq!(website_endpoint("us-east-1"), "s3-website-us-east-1.amazonaws.com");
/// assert_eq!(website_endpoint("eu-central-1"), "s3-website.eu-central-1.amazonaws.com");
/// ```
#[must_use]
pub fn website_endpoint(region: &str) -> String {
    let separator = if DASH_WEBSITE_REGIONS.contains(&region) { '-' } else { '.' };
    let suffix = if region.starts_with("cn-") { "amazonaws.com.cn" } else { "amazonaws.com" };
    format!("s3-website{separator}{region}.{suffix}")
}

/// Turn an SDK failure into an actionable [`ErrorKind`].
///
/// Missing buckets, authorization failures and transport failures each get
/// their own variant instead of collapsing into one "something went wrong".
fn classify<E, R>(err: SdkError<E, R>, bucket: &str) -> ErrorKind
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
        return ErrorKind::Network(DisplayErrorContext(&err).to_string());
    }
    match err.code() {
        Some("NoSuchBucket") => ErrorKind::BucketNotFound(bucket.to_string()),
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "AllAccessDisabled") => {
            ErrorKind::PermissionDenied(bucket.to_string())
        },
        _ => ErrorKind::BackendError(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl Bucket for S3Backend {
    fn name(&self) -> &str {
        &self.bucket
    }

    fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    fn list_stream(&self) -> ObjectInfoStream<'_> {
        let list_prefix = self.prefix.as_deref().map(|prefix| format!("{prefix}/"));
        Box::pin(stream! {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(list_prefix)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = match page {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(exn::Exn::from(classify(e, &self.bucket)));
                        return;
                    },
                };
                for object in page.contents() {
                    match self.object_info(object) {
                        Ok(Some(info)) => yield Ok(info),
                        Ok(None) => {},
                        Err(e) => yield Err(e),
                    }
                }
            }
        })
    }

    async fn upload(&self, key: &str, source: &Path, content_type: &str) -> Result<()> {
        let full_key = self.full_key(key)?;
        let len = tokio::fs::metadata(source).await.map_err(|e| ErrorKind::from_io(e, source))?.len();
        if self.chunk_size.parts_for(len) <= 1 {
            self.put_object(&full_key, source, content_type).await
        } else {
            self.multipart_upload(&full_key, source, content_type, len).await
        }
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<String>> {
        let mut deleted = Vec::with_capacity(keys.len());
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            // Listed keys go back exactly as listed: normalizing them could
            // address a different object.
            let pairs: Vec<(&String, String)> = batch.iter().map(|key| (key, self.listed_key(key))).collect();
            let objects = pairs
                .iter()
                .map(|(_, full)| ObjectIdentifier::builder().key(full).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .or_raise(|| ErrorKind::BackendError("invalid delete request".to_string()))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .or_raise(|| ErrorKind::BackendError("invalid delete request".to_string()))?;
            let output = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| classify(e, &self.bucket))?;

            let failed: HashSet<&str> = output.errors().iter().filter_map(|error| error.key()).collect();
            for error in output.errors() {
                tracing::warn!(
                    bucket = %self.bucket,
                    key = error.key(),
                    code = error.code(),
                    message = error.message(),
                    "Could not delete object"
                );
            }
            deleted.extend(pairs.iter().filter(|(_, full)| !failed.contains(full.as_str())).map(|(key, _)| (*key).clone()));
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadOutput;
    use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadOutput;
    use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
    use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::operation::upload_part::{UploadPartError, UploadPartOutput};
    use aws_sdk_s3::types::Error as S3Error;
    use aws_smithy_mocks::{RuleMode, mock, mock_client};
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    /// Requests seen by a mock rule, recorded from inside its matcher.
    type Seen<T> = Arc<Mutex<Vec<T>>>;

    fn small_chunk_backend(client: Client) -> S3Backend {
        S3Backend::with_client(client, "example.com", None, ChunkSize::new(MIN_PART_SIZE).unwrap(), false).unwrap()
    }

    fn source_file(dir: &tempfile::TempDir, len: usize) -> std::path::PathBuf {
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, vec![b'x'; len]).unwrap();
        path
    }

    /// Client for tests that never reach the network.
    fn offline_client() -> Client {
        Client::from_conf(
            aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .build(),
        )
    }

    fn backend(client: Client, prefix: Option<&str>) -> S3Backend {
        S3Backend::with_client(client, "example.com", prefix.map(str::to_string), ChunkSize::default(), false).unwrap()
    }

    #[rstest]
    #[case("us-east-1", "s3-website-us-east-1.amazonaws.com")]
    #[case("us-west-2", "s3-website-us-west-2.amazonaws.com")]
    #[case("eu-west-1", "s3-website-eu-west-1.amazonaws.com")]
    #[case("eu-central-1", "s3-website.eu-central-1.amazonaws.com")]
    #[case("ap-south-1", "s3-website.ap-south-1.amazonaws.com")]
    #[case("cn-north-1", "s3-website.cn-north-1.amazonaws.com.cn")]
    fn test_website_endpoint(#[case] region: &str, #[case] expected: &str) {
        assert_eq!(website_endpoint(region), expected);
    }

    #[rstest]
    #[case(MIN_PART_SIZE - 1, false)]
    #[case(MIN_PART_SIZE, true)]
    #[case(8 * 1024 * 1024, true)]
    #[case(MAX_PART_SIZE, true)]
    #[case(MAX_PART_SIZE + 1, false)]
    fn test_chunk_size_limits(#[case] bytes: usize, #[case] valid: bool) {
        let client = offline_client();
        let result = S3Backend::with_client(client, "example.com", None, ChunkSize::new(bytes).unwrap(), false);
        assert_eq!(result.is_ok(), valid);
    }

    #[test]
    fn test_full_key() {
        let without = backend(offline_client(), None);
        assert_eq!(without.full_key("css/site.css").unwrap(), "css/site.css");
        let with = backend(offline_client(), Some("site/"));
        assert_eq!(with.full_key("css/site.css").unwrap(), "site/css/site.css");
        assert!(with.full_key("../escape.html").is_err());
    }

    #[tokio::test]
    async fn test_list_follows_pages_and_strips_prefix() {
        let first = mock!(Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("site/index.html").e_tag("\"aaa\"").size(10).build())
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second = mock!(Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("site/css/site.css").e_tag("\"bbb-2\"").size(20).build())
                    .is_truncated(false)
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first, &second]);
        let bucket = backend(client, Some("site"));

        let objects = bucket.list().await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].key, "index.html");
        assert_eq!(objects[0].etag, "\"aaa\"");
        assert_eq!(objects[0].size, 10);
        assert_eq!(objects[1].key, "css/site.css");
        assert_eq!(objects[1].etag, "\"bbb-2\"");
    }

    #[tokio::test]
    async fn test_delete_many_excludes_refused_keys() {
        let rule = mock!(Client::delete_objects).then_output(|| {
            DeleteObjectsOutput::builder()
                .errors(S3Error::builder().key("b.html").code("AccessDenied").message("nope").build())
                .build()
        });
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let bucket = backend(client, None);

        let deleted = bucket.delete_many(&["a.html".to_string(), "b.html".to_string()]).await.unwrap();
        assert_eq!(deleted, vec!["a.html".to_string()]);
        // Nothing to delete: no request, no error.
        assert!(bucket.delete_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_many_sends_listed_keys_verbatim() {
        let seen: Seen<String> = Arc::default();
        let sink = seen.clone();
        let rule = mock!(Client::delete_objects)
            .match_requests(move |req| {
                let keys = req.delete().map(|delete| delete.objects()).unwrap_or_default();
                sink.lock().unwrap().extend(keys.iter().map(|object| object.key().to_string()));
                true
            })
            .then_output(|| DeleteObjectsOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let bucket = backend(client, Some("site"));

        // Keys exactly as a listing can report them, including ones that are
        // not valid local paths.
        let stale: Vec<String> = ["a//b.html", "img/", "./x.html", "../x.html"].map(str::to_string).to_vec();
        let deleted = bucket.delete_many(&stale).await.unwrap();

        assert_eq!(deleted, stale);
        assert_eq!(*seen.lock().unwrap(), vec!["site/a//b.html", "site/img/", "site/./x.html", "site/../x.html"]);
    }

    #[tokio::test]
    async fn test_exactly_one_chunk_is_a_single_put() {
        let seen: Seen<(String, Option<usize>)> = Arc::default();
        let sink = seen.clone();
        let put = mock!(Client::put_object)
            .match_requests(move |req| {
                let key = req.key().unwrap_or_default().to_string();
                sink.lock().unwrap().push((key, req.body().bytes().map(<[u8]>::len)));
                true
            })
            .then_output(|| PutObjectOutput::builder().e_tag("\"etag\"").build());
        // Any multipart request would find no rule and fail the upload.
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&put]);
        let bucket = small_chunk_backend(client);
        let dir = tempfile::tempdir().unwrap();

        bucket.upload("blob.bin", &source_file(&dir, MIN_PART_SIZE), "application/octet-stream").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![("blob.bin".to_string(), Some(MIN_PART_SIZE))]);
    }

    #[tokio::test]
    async fn test_one_byte_over_is_two_parts() {
        let parts: Seen<(Option<i32>, Option<usize>)> = Arc::default();
        let completed: Seen<Vec<Option<i32>>> = Arc::default();
        let create = mock!(Client::create_multipart_upload)
            .then_output(|| CreateMultipartUploadOutput::builder().upload_id("upload-1").build());
        let upload_part = |number: i32| {
            let sink = parts.clone();
            mock!(Client::upload_part)
                .match_requests(move |req| {
                    if req.part_number() != Some(number) {
                        return false;
                    }
                    sink.lock().unwrap().push((req.part_number(), req.body().bytes().map(<[u8]>::len)));
                    true
                })
                .then_output(move || UploadPartOutput::builder().e_tag(format!("\"part-{number}\"")).build())
        };
        let (first, second) = (upload_part(1), upload_part(2));
        let sink = completed.clone();
        let complete = mock!(Client::complete_multipart_upload)
            .match_requests(move |req| {
                let numbers = req.multipart_upload().map(|upload| upload.parts()).unwrap_or_default();
                sink.lock().unwrap().push(numbers.iter().map(|part| part.part_number()).collect());
                req.upload_id() == Some("upload-1")
            })
            .then_output(|| CompleteMultipartUploadOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&create, &first, &second, &complete]);
        let bucket = small_chunk_backend(client);
        let dir = tempfile::tempdir().unwrap();

        bucket.upload("blob.bin", &source_file(&dir, MIN_PART_SIZE + 1), "application/octet-stream").await.unwrap();
        assert_eq!(*parts.lock().unwrap(), vec![(Some(1), Some(MIN_PART_SIZE)), (Some(2), Some(1))]);
        assert_eq!(*completed.lock().unwrap(), vec![vec![Some(1), Some(2)]]);
    }

    #[tokio::test]
    async fn test_failed_part_aborts_upload() {
        let aborted: Seen<Option<String>> = Arc::default();
        let create = mock!(Client::create_multipart_upload)
            .then_output(|| CreateMultipartUploadOutput::builder().upload_id("upload-1").build());
        let failing_part = mock!(Client::upload_part)
            .then_error(|| UploadPartError::generic(ErrorMetadata::builder().code("EntityTooSmall").build()));
        let sink = aborted.clone();
        let abort = mock!(Client::abort_multipart_upload)
            .match_requests(move |req| {
                sink.lock().unwrap().push(req.upload_id().map(str::to_string));
                true
            })
            .then_output(|| AbortMultipartUploadOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&create, &failing_part, &abort]);
        let bucket = small_chunk_backend(client);
        let dir = tempfile::tempdir().unwrap();

        let err = bucket
            .upload("blob.bin", &source_file(&dir, MIN_PART_SIZE + 1), "application/octet-stream")
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
        assert_eq!(*aborted.lock().unwrap(), vec![Some("upload-1".to_string())]);
    }
}
