use bytes::Bytes;
use log::debug;
use s3k_core::{Context, Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::types::*;
use crate::{Config, HttpObjectStore, ObjectStore};

/// Max keys of one `DeleteObjects` request.
const MAX_DELETE_OBJECTS: usize = 1000;

/// S3k is a facade over an [`ObjectStore`] that fills in the configured
/// bucket, key prefix and delimiter.
///
/// - Bucket is used when a call doesn't name one.
/// - Prefix is prepended to every key, and to the prefix of list calls.
/// - Delimiter is used when a list call doesn't set one.
#[derive(Debug, Clone)]
pub struct S3k<S: ObjectStore = HttpObjectStore> {
    store: S,

    bucket: Option<String>,
    prefix: Option<String>,
    delimiter: Option<String>,
}

impl S3k<HttpObjectStore> {
    /// Create a client talking to `config.endpoint` over HTTP.
    ///
    /// Returns a `ConfigInvalid` error unless endpoint, access key id and
    /// secret access key are set.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let store = HttpObjectStore::new(ctx, &config)?;
        Ok(Self::with_store(store, &config))
    }
}

impl<S: ObjectStore> S3k<S> {
    /// Create a client over a custom store.
    pub fn with_store(store: S, config: &Config) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|v| !v.is_empty());

        Self {
            store,
            bucket: non_empty(&config.bucket),
            prefix: non_empty(&config.prefix),
            delimiter: non_empty(&config.delimiter),
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn fill_bucket(&self, bucket: &mut Option<String>) {
        if bucket.as_deref().map_or(true, str::is_empty) {
            bucket.clone_from(&self.bucket);
        }
    }

    fn prefixed(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_string(),
        }
    }

    /// Read the ACL of the bucket.
    pub async fn get_bucket_acl(&self, mut input: GetBucketAclInput) -> Result<AccessControlPolicy> {
        self.fill_bucket(&mut input.bucket);
        self.store.get_bucket_acl(input).await
    }

    /// Replace the ACL of the bucket.
    pub async fn put_bucket_acl(&self, mut input: PutBucketAclInput) -> Result<()> {
        self.fill_bucket(&mut input.bucket);
        self.store.put_bucket_acl(input).await
    }

    /// List objects, the configured prefix is prepended to `input.prefix`.
    pub async fn list_objects(&self, mut input: ListObjectsInput) -> Result<ListObjectsOutput> {
        self.fill_bucket(&mut input.bucket);
        if self.prefix.is_some() {
            input.prefix = Some(self.prefixed(input.prefix.as_deref().unwrap_or_default()));
        }
        if input.delimiter.is_none() {
            input.delimiter.clone_from(&self.delimiter);
        }
        self.store.list_objects(input).await
    }

    /// Read an object.
    pub async fn get_object(&self, mut input: GetObjectInput) -> Result<GetObjectOutput> {
        self.fill_bucket(&mut input.bucket);
        input.key = self.prefixed(&input.key);
        self.store.get_object(input).await
    }

    /// Read an object as a stream, the body is pulled from the service as
    /// the caller consumes it.
    pub async fn get_object_stream(
        &self,
        mut input: GetObjectInput,
    ) -> Result<GetObjectStreamOutput> {
        self.fill_bucket(&mut input.bucket);
        input.key = self.prefixed(&input.key);
        self.store.get_object_stream(input).await
    }

    /// Write an object whose body is fully in memory.
    pub async fn put_object(&self, mut input: PutObjectInput) -> Result<PutObjectOutput> {
        self.fill_bucket(&mut input.bucket);
        input.key = self.prefixed(&input.key);
        self.store.put_object(input).await
    }

    /// Write an object from a reader of unknown size.
    ///
    /// The reader is drained into memory then written with a single put.
    pub async fn upload<R>(&self, input: UploadInput<R>) -> Result<PutObjectOutput>
    where
        R: AsyncRead + Unpin + Send,
    {
        let UploadInput {
            bucket,
            key,
            mut body,
            content_type,
            acl,
        } = input;

        let mut buf = Vec::new();
        body.read_to_end(&mut buf).await.map_err(|err| {
            Error::unexpected("failed to read upload body")
                .with_source(err)
                .with_context(format!("key: {key}"))
        })?;
        debug!("uploading {} bytes to {key}", buf.len());

        self.put_object(PutObjectInput {
            bucket,
            key,
            body: Bytes::from(buf),
            content_type,
            acl,
        })
        .await
    }

    /// Delete an object.
    pub async fn delete_object(&self, mut input: DeleteObjectInput) -> Result<()> {
        self.fill_bucket(&mut input.bucket);
        input.key = self.prefixed(&input.key);
        self.store.delete_object(input).await
    }

    /// Delete a batch of objects, every key gets the configured prefix.
    pub async fn delete_objects(&self, mut input: DeleteObjectsInput) -> Result<DeleteObjectsOutput> {
        self.fill_bucket(&mut input.bucket);
        input.keys = input.keys.iter().map(|key| self.prefixed(key)).collect();
        self.store.delete_objects(input).await
    }

    /// Delete every object under `dir/`, following truncated listings.
    ///
    /// Keys are deleted in batches of at most 1000.
    pub async fn delete_directory(
        &self,
        bucket: Option<String>,
        dir: &str,
    ) -> Result<DeleteObjectsOutput> {
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            return Err(Error::request_invalid(
                "directory must not be empty, refusing to delete the whole prefix",
            ));
        }

        let mut bucket = bucket;
        self.fill_bucket(&mut bucket);
        let prefix = self.prefixed(&format!("{dir}/"));

        let mut keys = Vec::new();
        let mut marker = None;
        loop {
            let out = self
                .store
                .list_objects(ListObjectsInput {
                    bucket: bucket.clone(),
                    prefix: Some(prefix.clone()),
                    marker: marker.take(),
                    ..Default::default()
                })
                .await?;
            keys.extend(out.contents.iter().map(|v| v.key.clone()));

            match out.continuation_marker() {
                Some(v) => marker = Some(v),
                None => break,
            }
        }
        debug!("deleting {} objects under {prefix}", keys.len());

        let mut output = DeleteObjectsOutput::default();
        for chunk in keys.chunks(MAX_DELETE_OBJECTS) {
            let out = self
                .store
                .delete_objects(DeleteObjectsInput {
                    bucket: bucket.clone(),
                    keys: chunk.to_vec(),
                    quiet: false,
                })
                .await?;
            output.deleted.extend(out.deleted);
            output.errors.extend(out.errors);
        }
        Ok(output)
    }
}
