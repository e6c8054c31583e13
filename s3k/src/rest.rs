use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED, RANGE};
use http::{HeaderMap, HeaderValue, Method, Response, Uri};
use log::debug;
use percent_encoding::utf8_percent_encode;
use quick_xml::{de, se};
use s3k_aws_v4::{
    RequestSigner, AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, DEFAULT_SERVICE,
    X_AMZ_CONTENT_SHA_256,
};
use s3k_core::hash::{base64_md5, hex_sha256};
use s3k_core::{ByteStream, Context, Error, Result, SigningRequest};
use serde::de::DeserializeOwned;

use crate::error::parse_service_error;
use crate::types::*;
use crate::{Config, ObjectStore};

const X_AMZ_ACL: &str = "x-amz-acl";
const CONTENT_MD5: &str = "content-md5";

/// HttpObjectStore talks to an S3 compatible REST API.
///
/// Requests use path-style addressing (`<endpoint>/<bucket>/<key>`), are
/// signed in headers with AWS SigV4 and sent through the [`Context`]'s
/// [`HttpSend`](s3k_core::HttpSend).
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    ctx: Context,
    signer: RequestSigner,

    scheme: String,
    host: String,
    base_path: String,
    region: Option<String>,
}

impl HttpObjectStore {
    /// Create a store from a validated config.
    ///
    /// Endpoints without a scheme default to `https`, the context's
    /// [`HttpSend`](s3k_core::HttpSend) must then support TLS. The
    /// `rustls-tls` feature of `s3k-http-send-reqwest`, on by default, does.
    pub fn new(ctx: Context, config: &Config) -> Result<Self> {
        let credential = config.credential()?;
        let endpoint = config.endpoint.as_deref().unwrap_or_default();

        let uri: Uri = endpoint.parse().map_err(|err| {
            Error::config_invalid("endpoint is not a valid uri")
                .with_source(err)
                .with_context(format!("endpoint: {endpoint}"))
        })?;
        let host = uri
            .authority()
            .ok_or_else(|| {
                Error::config_invalid("endpoint must contain a host")
                    .with_context(format!("endpoint: {endpoint}"))
            })?
            .to_string();

        Ok(Self {
            ctx,
            signer: RequestSigner::new(credential),
            scheme: uri.scheme_str().unwrap_or("https").to_string(),
            host,
            base_path: uri.path().trim_end_matches('/').to_string(),
            region: config.region.clone(),
        })
    }

    fn path(&self, bucket: &str, key: Option<&str>, query: &[(&str, String)]) -> String {
        let mut path = format!(
            "{}/{}",
            self.base_path,
            utf8_percent_encode(bucket, &AWS_URI_ENCODE_SET)
        );
        if let Some(key) = key {
            path.push('/');
            path.push_str(&utf8_percent_encode(key, &AWS_URI_ENCODE_SET).to_string());
        }

        let query = query
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.to_string()
                } else {
                    format!("{k}={}", utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET))
                }
            })
            .collect::<Vec<_>>();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        path
    }

    fn signed_request(
        &self,
        method: &Method,
        path: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<http::Request<Bytes>> {
        let mut signing = SigningRequest::new(&self.host, method.clone(), path)
            .with_service(DEFAULT_SERVICE);
        if let Some(region) = &self.region {
            signing = signing.with_region(region);
        }
        signing.headers = headers;
        signing.headers.insert(
            X_AMZ_CONTENT_SHA_256,
            HeaderValue::from_str(&hex_sha256(&body))?,
        );
        self.signer.sign_headers(&mut signing)?;

        let mut req = http::Request::builder()
            .method(method.clone())
            .uri(format!("{}://{}{path}", self.scheme, self.host))
            .body(body)?;
        *req.headers_mut() = signing.headers;
        Ok(req)
    }

    async fn send(
        &self,
        method: Method,
        path: String,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response<Bytes>> {
        let req = self.signed_request(&method, &path, headers, body)?;

        debug!("sending {method} {path}");
        let resp = self.ctx.http_send(req).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(
                parse_service_error(status, resp.headers(), resp.body())
                    .with_context(format!("{method} {path}")),
            );
        }
        Ok(resp)
    }

    async fn send_stream(
        &self,
        method: Method,
        path: String,
        headers: HeaderMap,
    ) -> Result<Response<ByteStream>> {
        let req = self.signed_request(&method, &path, headers, Bytes::new())?;

        debug!("streaming {method} {path}");
        let resp = self.ctx.http_send_stream(req).await?;
        let status = resp.status();
        if !status.is_success() {
            // Error documents are small, read them whole.
            let (parts, body) = resp.into_parts();
            let body = body
                .try_fold(Vec::new(), |mut buf, chunk| async move {
                    buf.extend_from_slice(&chunk);
                    Ok::<_, Error>(buf)
                })
                .await?;
            return Err(parse_service_error(status, &parts.headers, &body)
                .with_context(format!("{method} {path}")));
        }
        Ok(resp)
    }
}

fn get_object_headers(input: &GetObjectInput) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(range) = &input.range {
        headers.insert(RANGE, HeaderValue::from_str(range)?);
    }
    Ok(headers)
}

fn required_bucket(bucket: Option<&str>) -> Result<&str> {
    bucket.filter(|v| !v.is_empty()).ok_or_else(|| {
        Error::request_invalid("bucket is required, set it in the call or in the config")
    })
}

fn required_key(key: &str) -> Result<&str> {
    if key.is_empty() {
        return Err(Error::request_invalid("object key must not be empty"));
    }
    Ok(key)
}

fn header_string(headers: &HeaderMap, name: impl http::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn parse_xml<T: DeserializeOwned>(body: &[u8], document: &str) -> Result<T> {
    de::from_str(&String::from_utf8_lossy(body)).map_err(|err| {
        Error::unexpected(format!("failed to parse {document} response"))
            .with_source(err)
            .with_context(format!("response_length: {}", body.len()))
    })
}

fn to_xml<T: serde::Serialize>(value: &T, document: &str) -> Result<Bytes> {
    se::to_string(value).map(Bytes::from).map_err(|err| {
        Error::unexpected(format!("failed to serialize {document} request")).with_source(err)
    })
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list_objects(&self, input: ListObjectsInput) -> Result<ListObjectsOutput> {
        let bucket = required_bucket(input.bucket.as_deref())?;

        let mut query = Vec::new();
        if let Some(v) = input.delimiter {
            query.push(("delimiter", v));
        }
        if let Some(v) = input.marker {
            query.push(("marker", v));
        }
        if let Some(v) = input.max_keys {
            query.push(("max-keys", v.to_string()));
        }
        if let Some(v) = input.prefix {
            query.push(("prefix", v));
        }

        let path = self.path(bucket, None, &query);
        let resp = self
            .send(Method::GET, path, HeaderMap::new(), Bytes::new())
            .await?;
        parse_xml(resp.body(), "ListObjects")
    }

    async fn get_object(&self, input: GetObjectInput) -> Result<GetObjectOutput> {
        let bucket = required_bucket(input.bucket.as_deref())?;
        let key = required_key(&input.key)?;

        let headers = get_object_headers(&input)?;
        let path = self.path(bucket, Some(key), &[]);
        let resp = self.send(Method::GET, path, headers, Bytes::new()).await?;

        let (parts, body) = resp.into_parts();
        Ok(GetObjectOutput {
            content_length: header_string(&parts.headers, CONTENT_LENGTH)
                .and_then(|v| v.parse().ok())
                .unwrap_or(body.len() as u64),
            content_type: header_string(&parts.headers, CONTENT_TYPE),
            etag: header_string(&parts.headers, ETAG),
            last_modified: header_string(&parts.headers, LAST_MODIFIED),
            body,
        })
    }

    async fn get_object_stream(&self, input: GetObjectInput) -> Result<GetObjectStreamOutput> {
        let bucket = required_bucket(input.bucket.as_deref())?;
        let key = required_key(&input.key)?;

        let headers = get_object_headers(&input)?;
        let path = self.path(bucket, Some(key), &[]);
        let resp = self.send_stream(Method::GET, path, headers).await?;

        let (parts, body) = resp.into_parts();
        Ok(GetObjectStreamOutput {
            content_length: header_string(&parts.headers, CONTENT_LENGTH)
                .and_then(|v| v.parse().ok()),
            content_type: header_string(&parts.headers, CONTENT_TYPE),
            etag: header_string(&parts.headers, ETAG),
            last_modified: header_string(&parts.headers, LAST_MODIFIED),
            body,
        })
    }

    async fn put_object(&self, input: PutObjectInput) -> Result<PutObjectOutput> {
        let bucket = required_bucket(input.bucket.as_deref())?;
        let key = required_key(&input.key)?;

        let mut headers = HeaderMap::new();
        if let Some(v) = &input.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(v)?);
        }
        if let Some(acl) = input.acl {
            headers.insert(X_AMZ_ACL, HeaderValue::from_static(acl.as_str()));
        }

        let path = self.path(bucket, Some(key), &[]);
        let resp = self.send(Method::PUT, path, headers, input.body).await?;

        Ok(PutObjectOutput {
            etag: header_string(resp.headers(), ETAG),
        })
    }

    async fn delete_object(&self, input: DeleteObjectInput) -> Result<()> {
        let bucket = required_bucket(input.bucket.as_deref())?;
        let key = required_key(&input.key)?;

        let path = self.path(bucket, Some(key), &[]);
        self.send(Method::DELETE, path, HeaderMap::new(), Bytes::new())
            .await?;
        Ok(())
    }

    async fn delete_objects(&self, input: DeleteObjectsInput) -> Result<DeleteObjectsOutput> {
        let bucket = required_bucket(input.bucket.as_deref())?;
        if input.keys.is_empty() {
            return Ok(DeleteObjectsOutput::default());
        }

        let body = to_xml(
            &DeleteRequest {
                quiet: input.quiet,
                objects: input
                    .keys
                    .into_iter()
                    .map(|key| ObjectIdentifier { key })
                    .collect(),
            },
            "DeleteObjects",
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
        headers.insert(CONTENT_MD5, HeaderValue::from_str(&base64_md5(&body))?);

        let path = self.path(bucket, None, &[("delete", String::new())]);
        let resp = self.send(Method::POST, path, headers, body).await?;
        parse_xml(resp.body(), "DeleteObjects")
    }

    async fn get_bucket_acl(&self, input: GetBucketAclInput) -> Result<AccessControlPolicy> {
        let bucket = required_bucket(input.bucket.as_deref())?;

        let path = self.path(bucket, None, &[("acl", String::new())]);
        let resp = self
            .send(Method::GET, path, HeaderMap::new(), Bytes::new())
            .await?;
        parse_xml(resp.body(), "GetBucketAcl")
    }

    async fn put_bucket_acl(&self, input: PutBucketAclInput) -> Result<()> {
        let bucket = required_bucket(input.bucket.as_deref())?;

        let mut headers = HeaderMap::new();
        let body = match (&input.access_control_policy, input.acl) {
            (Some(policy), _) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
                to_xml(policy, "PutBucketAcl")?
            }
            (None, Some(acl)) => {
                headers.insert(X_AMZ_ACL, HeaderValue::from_static(acl.as_str()));
                Bytes::new()
            }
            (None, None) => {
                return Err(Error::request_invalid(
                    "PutBucketAcl requires a canned acl or an access control policy",
                )
                .with_context(format!("bucket: {bucket}")))
            }
        };

        let path = self.path(bucket, None, &[("acl", String::new())]);
        self.send(Method::PUT, path, headers, body).await?;
        Ok(())
    }
}
