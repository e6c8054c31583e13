use std::collections::HashMap;
use std::time::Duration;

use http::header::{AUTHORIZATION, DATE, HOST};
use http::request::Parts;
use http::{HeaderMap, HeaderValue};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use s3k_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use s3k_core::time::{format_date, format_iso8601, now, parse_iso8601, parse_rfc2822, DateTime};
use s3k_core::utils::redact_headers;
use s3k_core::{header_value_normalize, Result, SigningRequest};

use crate::constants::*;
use crate::Credential;

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// The signer is bound to one credential and keeps no state between calls.
/// Service defaults to `s3`, region is taken from the request or derived from
/// an `*.amazonaws.com` host.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credential: Credential,
    expires_in: Option<Duration>,

    time: Option<DateTime>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SigningMethod {
    Header,
    Query,
}

/// Output of one signature computation.
struct Signature {
    scope: String,
    signed_headers: String,
    signature: String,
}

impl RequestSigner {
    /// Create a new signer for the given credential.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            expires_in: None,
            time: None,
        }
    }

    /// Specify the signing time used when the request carries none.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Specify `X-Amz-Expires` of presigned requests.
    ///
    /// `s3` requests default to one day when this is not set.
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Sign the request in its headers.
    ///
    /// `host`, `x-amz-date`, `x-amz-content-sha256` (s3 only),
    /// `x-amz-security-token` and `authorization` are inserted into the
    /// request headers, which are returned.
    pub fn sign_headers<'a>(&self, req: &'a mut SigningRequest) -> Result<&'a HeaderMap> {
        let service = req
            .service
            .get_or_insert_with(|| DEFAULT_SERVICE.to_string())
            .clone();
        insert_host(req)?;

        let amz_date = req.header_get(X_AMZ_DATE)?.map(parse_iso8601).transpose()?;
        let now = match amz_date {
            Some(v) => v,
            None => {
                let now = self.fallback_time(req)?;
                req.headers
                    .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);
                now
            }
        };

        if service == DEFAULT_SERVICE && !req.headers.contains_key(X_AMZ_CONTENT_SHA_256) {
            req.headers.insert(
                X_AMZ_CONTENT_SHA_256,
                HeaderValue::from_static(EMPTY_STRING_SHA256),
            );
        }

        if let Some(token) = &self.credential.session_token {
            if !req.headers.contains_key(X_AMZ_SECURITY_TOKEN) {
                let mut value = HeaderValue::from_str(token)?;
                // Set token value sensitive to valid leaking.
                value.set_sensitive(true);
                req.headers.insert(X_AMZ_SECURITY_TOKEN, value);
            }
        }

        req.headers.remove(AUTHORIZATION);

        let query = req.query_pairs();
        let signature = self.calculate(req, SigningMethod::Header, &query, &service, now)?;

        let mut authorization = HeaderValue::from_str(&format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={}, Signature={}",
            self.credential.access_key_id,
            signature.scope,
            signature.signed_headers,
            signature.signature
        ))?;
        authorization.set_sensitive(true);
        req.headers.insert(AUTHORIZATION, authorization);

        debug!("signed headers: {:?}", redact_headers(&req.headers));
        Ok(&req.headers)
    }

    /// Sign the request in its query string, and return the signed path.
    ///
    /// `X-Amz-Date` and `X-Amz-Expires` already present in the query are
    /// kept, so a presigned path can be signed again to the same signature
    /// once its `X-Amz-Signature` is stripped.
    pub fn sign_path(&self, req: &mut SigningRequest) -> Result<String> {
        let service = req
            .service
            .get_or_insert_with(|| DEFAULT_SERVICE.to_string())
            .clone();
        insert_host(req)?;

        let mut query = req.query_pairs();

        if let Some(token) = &self.credential.session_token {
            query_set(&mut query, X_AMZ_SECURITY_TOKEN_QUERY, token);
        }

        if query_get(&query, X_AMZ_EXPIRES_QUERY).is_none() {
            let expires_in = match self.expires_in {
                Some(v) => Some(v),
                None if service == DEFAULT_SERVICE => Some(DEFAULT_S3_EXPIRES_IN),
                None => None,
            };
            if let Some(v) = expires_in {
                query_set(&mut query, X_AMZ_EXPIRES_QUERY, &v.as_secs().to_string());
            }
        }

        let amz_date = query_get(&query, X_AMZ_DATE_QUERY)
            .map(parse_iso8601)
            .transpose()?;
        let now = match amz_date {
            Some(v) => v,
            None => {
                let now = self.fallback_time(req)?;
                query_set(&mut query, X_AMZ_DATE_QUERY, &format_iso8601(now));
                now
            }
        };

        let region = self.region(req);
        query_set(&mut query, X_AMZ_ALGORITHM_QUERY, ALGORITHM);
        query_set(
            &mut query,
            X_AMZ_CREDENTIAL_QUERY,
            &format!(
                "{}/{}/{region}/{service}/{TERMINATOR}",
                self.credential.access_key_id,
                format_date(now),
            ),
        );
        query_set(
            &mut query,
            X_AMZ_SIGNED_HEADERS_QUERY,
            &req.header_name_to_vec_sorted().join(";"),
        );

        let signature = self.calculate(req, SigningMethod::Query, &query, &service, now)?;
        query_set(&mut query, X_AMZ_SIGNATURE_QUERY, &signature.signature);

        req.path = format!("{}?{}", req.path_only(), encode_query(&query));
        debug!("signed path: {}", req.path);
        Ok(req.path.clone())
    }

    /// Sign the request in its query string, and return the signed query
    /// parameters decoded.
    pub fn sign_query_string(&self, req: &mut SigningRequest) -> Result<HashMap<String, String>> {
        self.sign_path(req)?;

        Ok(req.query_pairs().into_iter().collect())
    }

    /// Sign an inbound request in headers, over the headers named in
    /// `signed_headers` only.
    ///
    /// Named headers that are absent from the request are signed as empty
    /// values, the result will not match the client's signature.
    pub fn sign_headers_from_request(
        &self,
        parts: &Parts,
        signed_headers: &[impl AsRef<str>],
    ) -> Result<HeaderMap> {
        let mut req = SigningRequest::from_parts(parts, signed_headers)?;
        self.sign_headers(&mut req)?;

        Ok(req.headers)
    }

    /// Sign an inbound request in its query string, over the headers named in
    /// `signed_headers` only.
    ///
    /// Any `X-Amz-Signature` or `Signature` already in the query is dropped
    /// before signing.
    pub fn sign_query_string_from_request(
        &self,
        parts: &Parts,
        signed_headers: &[impl AsRef<str>],
    ) -> Result<HashMap<String, String>> {
        let mut req = SigningRequest::from_parts(parts, signed_headers)?;
        strip_signature(&mut req);

        self.sign_query_string(&mut req)
    }

    fn fallback_time(&self, req: &SigningRequest) -> Result<DateTime> {
        match req.header_get(DATE.as_str())? {
            Some(v) => parse_rfc2822(v),
            None => Ok(self.time.unwrap_or_else(now)),
        }
    }

    fn region(&self, req: &SigningRequest) -> String {
        req.region
            .clone()
            .or_else(|| region_from_host(&req.host))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    fn calculate(
        &self,
        req: &SigningRequest,
        method: SigningMethod,
        query: &[(String, String)],
        service: &str,
        now: DateTime,
    ) -> Result<Signature> {
        let region = self.region(req);

        let creq = canonical_request(req, method, query, service)?;
        debug!("calculated canonical request: {creq}");

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = format!("{}/{region}/{service}/{TERMINATOR}", format_date(now));
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{scope}\n{}",
            format_iso8601(now),
            hex_sha256(creq.as_bytes())
        );
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = generate_signing_key(
            &self.credential.secret_access_key,
            now,
            &region,
            service,
        );

        Ok(Signature {
            scope,
            signed_headers: req.header_name_to_vec_sorted().join(";"),
            signature: hex_hmac_sha256(&signing_key, string_to_sign.as_bytes()),
        })
    }
}

/// Drop `X-Amz-Signature` and `Signature` from the request query, keeping the
/// other parameters in their original order.
pub(crate) fn strip_signature(req: &mut SigningRequest) {
    let query = req
        .query_pairs()
        .into_iter()
        .filter(|(k, _)| k != X_AMZ_SIGNATURE_QUERY && k != SIGNATURE_QUERY)
        .collect::<Vec<_>>();

    req.path = if query.is_empty() {
        req.path_only().to_string()
    } else {
        format!("{}?{}", req.path_only(), encode_query(&query))
    };
}

fn insert_host(req: &mut SigningRequest) -> Result<()> {
    if !req.headers.contains_key(HOST) {
        req.headers.insert(HOST, HeaderValue::from_str(&req.host)?);
    }
    Ok(())
}

fn query_get<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Replace the value of `key` in place, or append it.
fn query_set(query: &mut Vec<(String, String)>, key: &str, value: &str) {
    match query.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => query.push((key.to_string(), value.to_string())),
    }
}

/// Encode query pairs in their given order, empty keys are dropped.
fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_request(
    req: &SigningRequest,
    method: SigningMethod,
    query: &[(String, String)],
    service: &str,
) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    f.push_str(req.method.as_str());
    f.push('\n');

    // Insert encoded path
    f.push_str(&canonical_path(req.path_only(), service));
    f.push('\n');

    // Insert query
    let mut encoded_query = query
        .iter()
        .filter(|(k, _)| {
            !k.is_empty() && !(method == SigningMethod::Query && k == X_AMZ_SIGNATURE_QUERY)
        })
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    encoded_query.sort();
    f.push_str(
        &encoded_query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"),
    );
    f.push('\n');

    // Insert signed headers
    let signed_headers = req.header_name_to_vec_sorted();
    for header in signed_headers.iter() {
        let values = req
            .headers
            .get_all(*header)
            .iter()
            .map(|v| v.to_str().map(header_value_normalize))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        f.push_str(header);
        f.push(':');
        f.push_str(&values.join(","));
        f.push('\n');
    }
    f.push('\n');
    f.push_str(&signed_headers.join(";"));
    f.push('\n');

    // Insert payload hash
    match req.header_get(X_AMZ_CONTENT_SHA_256)? {
        Some(v) => f.push_str(v),
        None if method == SigningMethod::Query && service == DEFAULT_SERVICE => {
            f.push_str(UNSIGNED_PAYLOAD)
        }
        None => f.push_str(EMPTY_STRING_SHA256),
    }

    Ok(f)
}

/// Canonical path of a request.
///
/// `s3` paths are decoded then encoded once. Other services get a normalized
/// path whose segments are encoded again.
fn canonical_path(path: &str, service: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };

    if service == DEFAULT_SERVICE {
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        return utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string();
    }

    let mut segments = Vec::new();
    for piece in path.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(utf8_percent_encode(piece, &AWS_QUERY_ENCODE_SET).to_string()),
        }
    }

    let mut s = format!("/{}", segments.join("/"));
    if !segments.is_empty() && path.ends_with('/') {
        s.push('/');
    }
    s
}

/// Derive the region from an `*.amazonaws.com` or `*.amazonaws.com.cn` host.
///
/// - `bucket.s3.amazonaws.com` => `us-east-1`
/// - `s3-eu-west-1.amazonaws.com` => `eu-west-1`
/// - `sqs.ap-northeast-1.amazonaws.com` => `ap-northeast-1`
pub(crate) fn region_from_host(host: &str) -> Option<String> {
    let host = host.split(':').next().unwrap_or(host);
    let labels = host
        .strip_suffix(".amazonaws.com")
        .or_else(|| host.strip_suffix(".amazonaws.com.cn"))?;

    let labels = labels.split('.').collect::<Vec<_>>();
    let mut parts = match labels.as_slice() {
        [.., service, region] => [*service, *region],
        [service] => [*service, ""],
        [] => return None,
    };

    // Search domains put the region before the service.
    if parts[1] == "es" || parts[1] == "aoss" {
        parts.reverse();
    }

    if parts[1] == "s3" {
        return Some(DEFAULT_REGION.to_string());
    }
    if let Some(region) = parts.iter().find_map(|v| v.strip_prefix("s3-")) {
        return Some(region.to_string());
    }

    (!parts[1].is_empty()).then(|| parts[1].to_string())
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), TERMINATOR.as_bytes())
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use anyhow::Result;
    use aws_credential_types::Credentials;
    use aws_sigv4::http_request::PayloadChecksumKind;
    use aws_sigv4::http_request::PercentEncodingMode;
    use aws_sigv4::http_request::SignableBody;
    use aws_sigv4::http_request::SignableRequest;
    use aws_sigv4::http_request::SignatureLocation;
    use aws_sigv4::http_request::SigningSettings;
    use aws_sigv4::sign::v4;
    use chrono::TimeZone;
    use http::header;
    use http::Request;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    /// (name, request_builder)
    type TestCase = (&'static str, fn() -> Request<&'static str>);

    fn test_cases() -> Vec<TestCase> {
        vec![
            ("get_request", test_get_request),
            ("get_request_with_sse", test_get_request_with_sse),
            ("get_request_with_query", test_get_request_with_query),
            ("get_request_virtual_host", test_get_request_virtual_host),
            (
                "get_request_with_query_virtual_host",
                test_get_request_with_query_virtual_host,
            ),
            ("put_request", test_put_request),
            (
                "put_request_with_body_digest",
                test_put_request_with_body_digest,
            ),
        ]
    }

    fn test_get_request() -> Request<&'static str> {
        let mut req = Request::new("");
        *req.method_mut() = http::Method::GET;
        *req.uri_mut() = "http://127.0.0.1:9000/hello"
            .parse()
            .expect("url must be valid");

        req
    }

    fn test_get_request_with_sse() -> Request<&'static str> {
        let mut req = test_get_request();
        req.headers_mut().insert(
            "x-amz-server-side-encryption",
            "a".parse().expect("must be valid"),
        );
        req.headers_mut().insert(
            "x-amz-server-side-encryption-customer-algorithm",
            "b".parse().expect("must be valid"),
        );
        req.headers_mut().insert(
            "x-amz-server-side-encryption-customer-key",
            "c".parse().expect("must be valid"),
        );
        req.headers_mut().insert(
            "x-amz-server-side-encryption-customer-key-md5",
            "d".parse().expect("must be valid"),
        );

        req
    }

    fn test_get_request_with_query() -> Request<&'static str> {
        let mut req = Request::new("");
        *req.method_mut() = http::Method::GET;
        *req.uri_mut() = "http://127.0.0.1:9000/hello?list-type=2&max-keys=3&prefix=CI/&start-after=ExampleGuide.pdf"
            .parse()
            .expect("url must be valid");

        req
    }

    fn test_get_request_virtual_host() -> Request<&'static str> {
        let mut req = Request::new("");
        *req.method_mut() = http::Method::GET;
        *req.uri_mut() = "http://hello.s3.test.example.com"
            .parse()
            .expect("url must be valid");

        req
    }

    fn test_get_request_with_query_virtual_host() -> Request<&'static str> {
        let mut req = Request::new("");
        *req.method_mut() = http::Method::GET;
        *req.uri_mut() = "http://hello.s3.test.example.com?list-type=2&max-keys=3&prefix=CI/&start-after=ExampleGuide.pdf"
            .parse()
            .expect("url must be valid");

        req
    }

    fn test_put_request() -> Request<&'static str> {
        let content = "Hello,World!";
        let mut req = Request::new(content);
        *req.method_mut() = http::Method::PUT;
        *req.uri_mut() = "http://127.0.0.1:9000/hello"
            .parse()
            .expect("url must be valid");

        req.headers_mut().insert(
            header::CONTENT_LENGTH,
            HeaderValue::from_str(&content.len().to_string()).expect("must be valid"),
        );

        req
    }

    fn test_put_request_with_body_digest() -> Request<&'static str> {
        let mut req = test_put_request();

        let body = hex_sha256(req.body().as_bytes());
        req.headers_mut().insert(
            "x-amz-content-sha256",
            HeaderValue::from_str(&body).expect("must be valid"),
        );

        req
    }

    fn test_time() -> DateTime {
        chrono::Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 20, 30)
            .single()
            .expect("time must be valid")
    }

    fn signing_request(req: &Request<&str>) -> SigningRequest {
        let uri = req.uri();
        let path = match uri.query() {
            Some(q) => format!("{}?{q}", uri.path()),
            None => uri.path().to_string(),
        };

        let mut signing = SigningRequest::new(
            uri.authority().expect("authority must exist").as_str(),
            req.method().clone(),
            path,
        )
        .with_service("s3")
        .with_region("test");
        signing.headers = req.headers().clone();
        signing
    }

    fn format_headers(req: &Request<&str>) -> Vec<String> {
        let mut hs = req
            .headers()
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v.to_str().expect("must be valid")))
            .collect::<Vec<_>>();

        // Insert host if original request doesn't have it.
        let host = format!("host:{}", req.uri().authority().unwrap());
        if !hs.contains(&host) {
            hs.push(host)
        }

        hs.sort();
        hs
    }

    fn format_header_map(headers: &HeaderMap) -> Vec<String> {
        let mut hs = headers
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v.to_str().expect("must be valid")))
            .collect::<Vec<_>>();
        hs.sort();
        hs
    }

    fn format_query(query: &str) -> Vec<String> {
        let mut query = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| format!("{}={}", &k, &v))
            .collect::<Vec<_>>();
        query.sort();
        query
    }

    fn aws_sigv4_sign(
        req: &mut Request<&'static str>,
        token: Option<&str>,
        in_query: bool,
    ) -> Result<()> {
        let mut ss = SigningSettings::default();
        ss.percent_encoding_mode = PercentEncodingMode::Single;
        ss.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
        if in_query {
            ss.signature_location = SignatureLocation::QueryParams;
            ss.expires_in = Some(Duration::from_secs(3600));
        }
        let id = Credentials::new(
            "access_key_id",
            "secret_access_key",
            token.map(|v| v.to_string()),
            None,
            "hardcoded-credentials",
        )
        .into();
        let sp = v4::SigningParams::builder()
            .identity(&id)
            .region("test")
            .name("s3")
            .time(SystemTime::from(test_time()))
            .settings(ss)
            .build()
            .expect("signing params must be valid");

        let body = match (in_query, req.headers().get(X_AMZ_CONTENT_SHA_256)) {
            (_, Some(_)) => SignableBody::Bytes(req.body().as_bytes()),
            (true, None) => SignableBody::UnsignedPayload,
            (false, None) => SignableBody::Bytes(&[]),
        };

        let output = aws_sigv4::http_request::sign(
            SignableRequest::new(
                req.method().as_str(),
                req.uri().to_string(),
                req.headers()
                    .iter()
                    .map(|(k, v)| (k.as_str(), std::str::from_utf8(v.as_bytes()).unwrap())),
                body,
            )
            .unwrap(),
            &sp.into(),
        )?;
        let (aws_sig, _) = output.into_parts();
        aws_sig.apply_to_request_http1x(req);
        Ok(())
    }

    fn signer(token: Option<&str>) -> RequestSigner {
        let mut cred = Credential::new("access_key_id", "secret_access_key");
        if let Some(token) = token {
            cred = cred.with_session_token(token);
        }
        RequestSigner::new(cred).with_time(test_time())
    }

    #[test]
    fn test_sign_headers_matches_aws_sigv4() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        for token in [None, Some("security_token")] {
            for (name, req_fn) in test_cases() {
                let mut expected = req_fn();
                aws_sigv4_sign(&mut expected, token, false)?;

                let mut signing = signing_request(&req_fn());
                let headers = signer(token).sign_headers(&mut signing)?;

                assert_eq!(
                    format_headers(&expected),
                    format_header_map(headers),
                    "{name} header mismatch with token {token:?}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_sign_path_matches_aws_sigv4() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        for token in [None, Some("security_token")] {
            for (name, req_fn) in test_cases() {
                let mut expected = req_fn();
                aws_sigv4_sign(&mut expected, token, true)?;

                let mut signing = signing_request(&req_fn());
                let path = signer(token)
                    .with_expires_in(Duration::from_secs(3600))
                    .sign_path(&mut signing)?;

                let (_, query) = path.split_once('?').expect("query must exist");
                assert_eq!(
                    format_query(expected.uri().query().unwrap_or_default()),
                    format_query(query),
                    "{name} query mismatch with token {token:?}"
                );
            }
        }
        Ok(())
    }

    #[test_case("/", "s3", "/"; "root")]
    #[test_case("", "s3", "/"; "empty")]
    #[test_case("/a%20b/c+d", "s3", "/a%20b/c%2Bd"; "s3 decodes once")]
    #[test_case("/photos//2024/./a.jpg", "s3", "/photos//2024/./a.jpg"; "s3 keeps dots")]
    #[test_case("/a%20b", "service", "/a%2520b"; "double encoded")]
    #[test_case("//example//", "service", "/example/"; "collapse slashes")]
    #[test_case("/example1/example2/../..", "service", "/"; "relative")]
    #[test_case("/./", "service", "/"; "dot")]
    fn test_canonical_path(path: &str, service: &str, expected: &str) {
        assert_eq!(canonical_path(path, service), expected);
    }

    #[test_case("examplebucket.s3.amazonaws.com", Some("us-east-1"); "global s3")]
    #[test_case("s3.amazonaws.com", None; "bare s3")]
    #[test_case("s3-eu-west-1.amazonaws.com", Some("eu-west-1"); "legacy s3 dash")]
    #[test_case("bucket.s3-ap-southeast-2.amazonaws.com:443", Some("ap-southeast-2"); "legacy s3 dash with port")]
    #[test_case("bucket.s3.eu-central-1.amazonaws.com", Some("eu-central-1"); "regional s3")]
    #[test_case("sqs.ap-northeast-1.amazonaws.com", Some("ap-northeast-1"); "other service")]
    #[test_case("search-logs-abc.us-west-2.es.amazonaws.com", Some("us-west-2"); "search domain")]
    #[test_case("s3.cn-north-1.amazonaws.com.cn", Some("cn-north-1"); "china")]
    #[test_case("example.amazonaws.com", None; "service only")]
    #[test_case("127.0.0.1:9000", None; "not aws")]
    fn test_region_from_host(host: &str, expected: Option<&str>) {
        assert_eq!(region_from_host(host).as_deref(), expected);
    }

    #[test]
    fn test_query_set_keeps_position() {
        let mut query = vec![
            ("a".to_string(), "1".to_string()),
            ("X-Amz-Date".to_string(), "old".to_string()),
        ];
        query_set(&mut query, "X-Amz-Date", "new");
        query_set(&mut query, "b", "2");
        assert_eq!(
            query,
            vec![
                ("a".to_string(), "1".to_string()),
                ("X-Amz-Date".to_string(), "new".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(query_get(&query, "b"), Some("2"));
        assert_eq!(query_get(&query, "c"), None);
    }

    #[test]
    fn test_encode_query() {
        let query = vec![
            ("prefix".to_string(), "CI/a b".to_string()),
            ("".to_string(), "dropped".to_string()),
            ("acl".to_string(), "".to_string()),
        ];
        assert_eq!(encode_query(&query), "prefix=CI%2Fa%20b&acl=");
    }

    #[test]
    fn test_strip_signature() {
        let mut req = SigningRequest::new(
            "example.com",
            http::Method::GET,
            "/key?X-Amz-Signature=abc&prefix=a%2Fb&Signature=def",
        );
        strip_signature(&mut req);
        assert_eq!(req.path, "/key?prefix=a%2Fb");

        let mut req = SigningRequest::new("example.com", http::Method::GET, "/key?Signature=x");
        strip_signature(&mut req);
        assert_eq!(req.path, "/key");
    }

    #[test]
    fn test_sign_headers_uses_date_header() -> Result<()> {
        let mut req = SigningRequest::new("example.amazonaws.com", http::Method::GET, "/")
            .with_service("service")
            .with_header("date", "Sun, 30 Aug 2015 12:36:00 GMT")?;

        let headers = RequestSigner::new(Credential::new("AKIDEXAMPLE", "secret"))
            .sign_headers(&mut req)?;
        assert_eq!(headers[X_AMZ_DATE].to_str()?, "20150830T123600Z");
        assert!(!headers.contains_key(X_AMZ_CONTENT_SHA_256));
        Ok(())
    }

    #[test]
    fn test_sign_headers_rejects_bad_date() -> Result<()> {
        let mut req = SigningRequest::new("example.com", http::Method::GET, "/")
            .with_header("x-amz-date", "yesterday")?;

        let err = signer(None).sign_headers(&mut req).unwrap_err();
        assert_eq!(err.kind(), s3k_core::ErrorKind::RequestInvalid);
        Ok(())
    }

    #[test]
    fn test_sign_path_default_expires() -> Result<()> {
        let mut req = SigningRequest::new("examplebucket.s3.amazonaws.com", http::Method::GET, "/a");
        let query = signer(None).sign_query_string(&mut req)?;
        assert_eq!(query[X_AMZ_EXPIRES_QUERY], "86400");
        assert_eq!(req.service.as_deref(), Some("s3"));

        let mut req = SigningRequest::new("sqs.us-west-2.amazonaws.com", http::Method::GET, "/")
            .with_service("sqs");
        let query = signer(None).sign_query_string(&mut req)?;
        assert!(!query.contains_key(X_AMZ_EXPIRES_QUERY));
        assert_eq!(
            query[X_AMZ_CREDENTIAL_QUERY],
            "access_key_id/20240501/us-west-2/sqs/aws4_request"
        );
        Ok(())
    }
}
