//! [`HttpSend`] implementation backed by [`reqwest`].
//!
//! The default `rustls-tls` feature lets [`ReqwestHttpSend::default`] reach
//! `https` endpoints.
//!
//! ```no_run
//! use s3k_core::Context;
//! use s3k_http_send_reqwest::ReqwestHttpSend;
//!
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use log::debug;
use reqwest::{Client, Request};
use s3k_core::{ByteStream, Error, HttpSend, Result};

/// ReqwestHttpSend sends requests with a [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, req: http::Request<Bytes>) -> Result<reqwest::Response> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let req = Request::try_from(req).map_err(|err| {
            Error::request_invalid("failed to convert request for reqwest")
                .with_source(err)
                .with_context(format!("uri: {uri}"))
        })?;
        self.client.execute(req).await.map_err(|err| {
            Error::unexpected("failed to send request")
                .with_source(err)
                .with_context(format!("{method} {uri}"))
        })
    }
}

fn response_parts<T>(resp: &reqwest::Response, body: T) -> http::Response<T> {
    let mut out = http::Response::new(body);
    *out.status_mut() = resp.status();
    *out.version_mut() = resp.version();
    *out.headers_mut() = resp.headers().clone();
    out
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let target = format!("{} {}", req.method(), req.uri());
        let resp = self.execute(req).await?;

        let head = response_parts(&resp, ());
        let body = resp.bytes().await.map_err(|err| {
            Error::unexpected("failed to read response body")
                .with_source(err)
                .with_context(target.clone())
        })?;
        debug!("{target} responded {} with {} bytes", head.status(), body.len());

        let (parts, _) = head.into_parts();
        Ok(http::Response::from_parts(parts, body))
    }

    async fn http_send_stream(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<ByteStream>> {
        let target = format!("{} {}", req.method(), req.uri());
        let resp = self.execute(req).await?;
        debug!("{target} responded {}, streaming body", resp.status());

        let head = response_parts(&resp, ());
        let body = resp
            .bytes_stream()
            .map_err(move |err| {
                Error::unexpected("failed to read response body")
                    .with_source(err)
                    .with_context(target.clone())
            })
            .boxed();

        let (parts, _) = head.into_parts();
        Ok(http::Response::from_parts(parts, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3k_core::{Context, ErrorKind};

    #[tokio::test]
    async fn test_send_to_closed_port() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
        let req = http::Request::builder()
            .uri("http://127.0.0.1:1/bucket/key")
            .body(Bytes::new())?;

        let err = ctx.http_send(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(err.to_string().contains("127.0.0.1:1"));
        Ok(())
    }

    #[test]
    fn test_tls_enabled_by_default() {
        // HttpObjectStore resolves endpoints without a scheme to https.
        assert!(cfg!(feature = "rustls-tls"));
    }

    #[tokio::test]
    async fn test_send_stream_to_closed_port() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
        let req = http::Request::builder()
            .uri("http://127.0.0.1:1/bucket/key")
            .body(Bytes::new())?;

        let err = ctx.http_send_stream(req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        let source = err.source_as::<reqwest::Error>().unwrap();
        assert!(source.is_connect());
        Ok(())
    }
}
