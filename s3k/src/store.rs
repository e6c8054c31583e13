use std::fmt::Debug;

use async_trait::async_trait;
use s3k_core::Result;

use crate::types::*;

/// ObjectStore is the set of object and bucket operations the [`S3k`](crate::S3k)
/// facade forwards to.
///
/// Inputs reach the store with bucket, prefix and delimiter already
/// defaulted by the facade.
#[async_trait]
pub trait ObjectStore: Debug + Send + Sync + 'static {
    /// List objects of a bucket.
    async fn list_objects(&self, input: ListObjectsInput) -> Result<ListObjectsOutput>;

    /// Read an object.
    async fn get_object(&self, input: GetObjectInput) -> Result<GetObjectOutput>;

    /// Read an object as a stream of chunks, without buffering its body.
    async fn get_object_stream(&self, input: GetObjectInput) -> Result<GetObjectStreamOutput>;

    /// Write an object.
    async fn put_object(&self, input: PutObjectInput) -> Result<PutObjectOutput>;

    /// Delete an object.
    async fn delete_object(&self, input: DeleteObjectInput) -> Result<()>;

    /// Delete a batch of objects.
    async fn delete_objects(&self, input: DeleteObjectsInput) -> Result<DeleteObjectsOutput>;

    /// Read the ACL of a bucket.
    async fn get_bucket_acl(&self, input: GetBucketAclInput) -> Result<AccessControlPolicy>;

    /// Replace the ACL of a bucket.
    async fn put_bucket_acl(&self, input: PutBucketAclInput) -> Result<()>;
}
