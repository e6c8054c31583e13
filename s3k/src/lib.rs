//! s3k is a thin client over S3 compatible object stores, plus the AWS
//! Signature Version 4 codec used to verify or re-sign inbound requests.
//!
//! ## Object store
//!
//! Endpoints without a scheme use `https`. [`ReqwestHttpSend`] speaks TLS
//! through the `rustls-tls` feature of `s3k-http-send-reqwest`, enabled by
//! default. Large objects can be read chunk by chunk with
//! [`S3k::get_object_stream`].
//!
//! [`ReqwestHttpSend`]: https://docs.rs/s3k-http-send-reqwest
//!
//! ```no_run
//! use s3k::{Config, Context, GetObjectInput, OsEnv, S3k};
//! use s3k_http_send_reqwest::ReqwestHttpSend;
//!
//! # async fn example() -> s3k::Result<()> {
//! let ctx = Context::new()
//!     .with_env(OsEnv)
//!     .with_http_send(ReqwestHttpSend::default());
//! let config = Config {
//!     bucket: Some("photos".to_string()),
//!     prefix: Some("app/".to_string()),
//!     ..Default::default()
//! }
//! .from_env(&ctx);
//!
//! let s3k = S3k::new(ctx, config)?;
//! // Reads `photos/app/2024/a.jpg`.
//! let out = s3k
//!     .get_object(GetObjectInput {
//!         key: "2024/a.jpg".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("read {} bytes", out.body.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Signature codec
//!
//! ```
//! use s3k::aws::parse_authorization_header;
//!
//! let material = parse_authorization_header(Some(
//!     "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/s3/aws4_request, SignedHeaders=host;x-amz-date, Signature=abcd",
//! ))
//! .unwrap();
//! assert_eq!(material.access_key_id, "AKIDEXAMPLE");
//! assert_eq!(material.signed_headers, vec!["host", "x-amz-date"]);
//! ```

pub use s3k_core::*;

/// AWS Signature Version 4 codec.
pub mod aws {
    pub use s3k_aws_v4::*;
}

mod client;
pub use client::S3k;

mod config;
pub use config::Config;
pub use config::{S3K_BUCKET, S3K_DELIMITER, S3K_ENDPOINT, S3K_PREFIX};

mod error;
pub use error::ServiceError;

mod rest;
pub use rest::HttpObjectStore;

mod store;
pub use store::ObjectStore;

mod types;
pub use types::*;
