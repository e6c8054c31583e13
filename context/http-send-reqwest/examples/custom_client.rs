//! Send a signed `ListObjects` request with a custom reqwest client.
//!
//! ```shell
//! S3K_ENDPOINT=http://127.0.0.1:9000 S3K_BUCKET=test \
//! AWS_ACCESS_KEY_ID=minioadmin AWS_SECRET_ACCESS_KEY=minioadmin \
//! cargo run --example custom_client
//! ```

use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use http::Method;
use reqwest::Client;
use s3k_aws_v4::{Credential, RequestSigner};
use s3k_core::{Context, OsEnv, SigningRequest};
use s3k_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .user_agent("s3k-example/0.1")
        .build()?;
    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::new(client));

    let endpoint = ctx
        .env_var("S3K_ENDPOINT")
        .unwrap_or_else(|| "http://127.0.0.1:9000".to_string());
    let bucket = ctx.env_var("S3K_BUCKET").unwrap_or_else(|| "test".to_string());
    let Some(credential) = Credential::from_env(&ctx) else {
        eprintln!("AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set");
        return Ok(());
    };

    let uri: http::Uri = format!("{endpoint}/{bucket}").parse()?;
    let host = uri
        .authority()
        .map(|v| v.to_string())
        .unwrap_or_default();
    let mut signing = SigningRequest::new(host, Method::GET, format!("/{bucket}"));
    let headers = RequestSigner::new(credential).sign_headers(&mut signing)?;

    let mut req = http::Request::builder().method(Method::GET).uri(uri);
    for (name, value) in headers {
        req = req.header(name, value);
    }

    match ctx.http_send_as_string(req.body(Bytes::new())?).await {
        Ok(resp) => {
            println!("Response status: {}", resp.status());
            println!("{}", resp.body());
        }
        Err(e) => eprintln!("Request failed: {e}"),
    }

    Ok(())
}
