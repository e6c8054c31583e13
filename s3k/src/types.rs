//! Inputs and outputs of object store operations.
//!
//! XML documents follow the S3 REST API and are (de)serialized with
//! `quick-xml`.

use std::fmt::{self, Debug};

use bytes::Bytes;
use futures::TryStreamExt;
use s3k_core::{ByteStream, Error, Result};
use serde::{Deserialize, Serialize};

/// Input of `ListObjects`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsInput {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub marker: Option<String>,
    pub max_keys: Option<usize>,
}

/// `ListBucketResult` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListObjectsOutput {
    pub name: String,
    pub prefix: String,
    pub marker: String,
    pub next_marker: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: usize,
    pub is_truncated: bool,
    pub contents: Vec<Object>,
    pub common_prefixes: Vec<CommonPrefix>,
}

impl ListObjectsOutput {
    /// Marker to continue a truncated listing from.
    ///
    /// `NextMarker` is only returned when a delimiter is set, the last key is
    /// used otherwise.
    pub fn continuation_marker(&self) -> Option<String> {
        if !self.is_truncated {
            return None;
        }

        self.next_marker
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| self.contents.last().map(|v| v.key.clone()))
    }
}

/// An object entry of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Object {
    pub key: String,
    pub last_modified: String,
    #[serde(rename = "ETag")]
    pub etag: String,
    pub size: u64,
    pub storage_class: String,
}

/// A common prefix of a delimited listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CommonPrefix {
    pub prefix: String,
}

/// Input of `GetObject`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectInput {
    pub bucket: Option<String>,
    pub key: String,
    /// Value of the `Range` header, like `bytes=0-9`.
    pub range: Option<String>,
}

/// Output of `GetObject`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectOutput {
    pub body: Bytes,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Output of `GetObject` whose body is read as it arrives.
pub struct GetObjectStreamOutput {
    pub body: ByteStream,
    /// Value of `Content-Length`, if the service sent one.
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Debug for GetObjectStreamOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetObjectStreamOutput")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

impl GetObjectStreamOutput {
    /// Drain the body into memory.
    pub async fn collect(self) -> Result<Bytes> {
        let buf = self
            .body
            .try_fold(Vec::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok::<_, Error>(buf)
            })
            .await?;
        Ok(Bytes::from(buf))
    }
}

/// Input of `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectInput {
    pub bucket: Option<String>,
    pub key: String,
    pub body: Bytes,
    pub content_type: Option<String>,
    /// Canned ACL sent as `x-amz-acl`.
    pub acl: Option<CannedAcl>,
}

/// Output of `PutObject`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    pub etag: Option<String>,
}

/// Input of `Upload`, a put whose body size is unknown upfront.
#[derive(Debug)]
pub struct UploadInput<R> {
    pub bucket: Option<String>,
    pub key: String,
    pub body: R,
    pub content_type: Option<String>,
    pub acl: Option<CannedAcl>,
}

/// Input of `DeleteObject`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteObjectInput {
    pub bucket: Option<String>,
    pub key: String,
}

/// Input of `DeleteObjects`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteObjectsInput {
    pub bucket: Option<String>,
    pub keys: Vec<String>,
    /// Only report failed keys in the response.
    pub quiet: bool,
}

/// `Delete` request document.
#[derive(Debug, Serialize)]
#[serde(rename = "Delete", rename_all = "PascalCase")]
pub(crate) struct DeleteRequest {
    pub quiet: bool,
    #[serde(rename = "Object")]
    pub objects: Vec<ObjectIdentifier>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ObjectIdentifier {
    pub key: String,
}

/// `DeleteResult` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeleteObjectsOutput {
    #[serde(rename = "Deleted")]
    pub deleted: Vec<DeletedObject>,
    #[serde(rename = "Error")]
    pub errors: Vec<DeleteError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeletedObject {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeleteError {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// Canned ACLs of the `x-amz-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
        }
    }
}

/// Input of `GetBucketAcl`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetBucketAclInput {
    pub bucket: Option<String>,
}

/// Input of `PutBucketAcl`.
///
/// Either a canned ACL or a full policy document, the policy wins when both
/// are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutBucketAclInput {
    pub bucket: Option<String>,
    pub acl: Option<CannedAcl>,
    pub access_control_policy: Option<AccessControlPolicy>,
}

/// `AccessControlPolicy` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename = "AccessControlPolicy", rename_all = "PascalCase")]
pub struct AccessControlPolicy {
    pub owner: Owner,
    pub access_control_list: AccessControlList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Owner {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AccessControlList {
    pub grant: Vec<Grant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Grant {
    pub grantee: Grantee,
    /// One of `FULL_CONTROL`, `WRITE`, `WRITE_ACP`, `READ`, `READ_ACP`.
    pub permission: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Grantee {
    #[serde(rename = "@xmlns:xsi", skip_serializing_if = "Option::is_none")]
    pub xmlns_xsi: Option<String>,
    /// One of `CanonicalUser`, `AmazonCustomerByEmail`, `Group`.
    #[serde(rename = "@xsi:type", skip_serializing_if = "Option::is_none")]
    pub grantee_type: Option<String>,
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(rename = "URI", skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Grantee {
    /// A canonical user grantee.
    pub fn canonical_user(id: impl Into<String>) -> Self {
        Self {
            xmlns_xsi: Some("http://www.w3.org/2001/XMLSchema-instance".to_string()),
            grantee_type: Some("CanonicalUser".to_string()),
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quick_xml::{de, se};

    #[test]
    fn test_parse_list_bucket_result() -> anyhow::Result<()> {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>photos</Name>
  <Prefix>app/2024/</Prefix>
  <Marker></Marker>
  <NextMarker>app/2024/b.jpg</NextMarker>
  <MaxKeys>2</MaxKeys>
  <Delimiter>/</Delimiter>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>app/2024/a.jpg</Key>
    <LastModified>2024-05-01T10:20:30.000Z</LastModified>
    <ETag>"fba9dede5f27731c9771645a39863328"</ETag>
    <Size>434234</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>app/2024/b.jpg</Key>
    <LastModified>2024-05-01T10:20:31.000Z</LastModified>
    <ETag>"1d9e8d7f0f7c43e1bd0b1fd7f0f8e2d1"</ETag>
    <Size>1024</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <CommonPrefixes>
    <Prefix>app/2024/thumbs/</Prefix>
  </CommonPrefixes>
</ListBucketResult>"#;

        let out: ListObjectsOutput = de::from_str(content)?;
        assert_eq!(out.name, "photos");
        assert_eq!(out.prefix, "app/2024/");
        assert_eq!(out.max_keys, 2);
        assert!(out.is_truncated);
        assert_eq!(out.contents.len(), 2);
        assert_eq!(out.contents[0].key, "app/2024/a.jpg");
        assert_eq!(out.contents[0].etag, "\"fba9dede5f27731c9771645a39863328\"");
        assert_eq!(out.contents[0].size, 434234);
        assert_eq!(
            out.common_prefixes,
            vec![CommonPrefix {
                prefix: "app/2024/thumbs/".to_string()
            }]
        );
        assert_eq!(out.continuation_marker().as_deref(), Some("app/2024/b.jpg"));
        Ok(())
    }

    #[test]
    fn test_continuation_marker() {
        let mut out = ListObjectsOutput {
            is_truncated: true,
            contents: vec![Object {
                key: "a".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(out.continuation_marker().as_deref(), Some("a"));

        out.is_truncated = false;
        assert_eq!(out.continuation_marker(), None);
    }

    #[test]
    fn test_serialize_delete_request() -> anyhow::Result<()> {
        let req = DeleteRequest {
            quiet: false,
            objects: vec![
                ObjectIdentifier {
                    key: "app/a.jpg".to_string(),
                },
                ObjectIdentifier {
                    key: "app/b.jpg".to_string(),
                },
            ],
        };

        assert_eq!(
            se::to_string(&req)?,
            "<Delete><Quiet>false</Quiet><Object><Key>app/a.jpg</Key></Object><Object><Key>app/b.jpg</Key></Object></Delete>"
        );
        Ok(())
    }

    #[test]
    fn test_parse_delete_result() -> anyhow::Result<()> {
        let content = r#"<DeleteResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Deleted>
    <Key>app/a.jpg</Key>
  </Deleted>
  <Deleted>
    <Key>app/b.jpg</Key>
  </Deleted>
  <Error>
    <Key>app/c.jpg</Key>
    <Code>AccessDenied</Code>
    <Message>Access Denied</Message>
  </Error>
</DeleteResult>"#;

        let out: DeleteObjectsOutput = de::from_str(content)?;
        assert_eq!(
            out.deleted
                .iter()
                .map(|v| v.key.as_str())
                .collect::<Vec<_>>(),
            vec!["app/a.jpg", "app/b.jpg"]
        );
        assert_eq!(
            out.errors,
            vec![DeleteError {
                key: "app/c.jpg".to_string(),
                code: "AccessDenied".to_string(),
                message: "Access Denied".to_string(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_parse_access_control_policy() -> anyhow::Result<()> {
        let content = r#"<AccessControlPolicy>
  <Owner>
    <ID>75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a</ID>
    <DisplayName>CustomersName@amazon.com</DisplayName>
  </Owner>
  <AccessControlList>
    <Grant>
      <Grantee xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="CanonicalUser">
        <ID>75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a</ID>
        <DisplayName>CustomersName@amazon.com</DisplayName>
      </Grantee>
      <Permission>FULL_CONTROL</Permission>
    </Grant>
  </AccessControlList>
</AccessControlPolicy>"#;

        let policy: AccessControlPolicy = de::from_str(content)?;
        assert_eq!(
            policy.owner.id,
            "75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a"
        );
        assert_eq!(policy.access_control_list.grant.len(), 1);
        let grant = &policy.access_control_list.grant[0];
        assert_eq!(grant.permission, "FULL_CONTROL");
        assert_eq!(
            grant.grantee.display_name.as_deref(),
            Some("CustomersName@amazon.com")
        );
        Ok(())
    }

    #[test]
    fn test_serialize_access_control_policy() -> anyhow::Result<()> {
        let policy = AccessControlPolicy {
            owner: Owner {
                id: "owner".to_string(),
                display_name: None,
            },
            access_control_list: AccessControlList {
                grant: vec![Grant {
                    grantee: Grantee::canonical_user("reader"),
                    permission: "READ".to_string(),
                }],
            },
        };

        let xml = se::to_string(&policy)?;
        assert!(xml.starts_with("<AccessControlPolicy><Owner><ID>owner</ID></Owner>"));
        assert!(xml.contains(r#"xsi:type="CanonicalUser""#));
        assert!(xml.contains("<ID>reader</ID>"));
        assert!(xml.contains("<Permission>READ</Permission>"));
        Ok(())
    }
}
