use http::header::HeaderName;
use http::header::HOST;
use http::request::Parts;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use log::warn;

use crate::{Error, Result};

/// The canonical input of signature computation.
///
/// It's usually built by the caller from an inbound HTTP request plus the
/// headers named in its signed header set, see [`SigningRequest::from_parts`].
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// Host of the request, without scheme.
    pub host: String,
    /// HTTP method.
    pub method: Method,
    /// Raw path, including the query string if any.
    pub path: String,
    /// HTTP headers that take part in signing.
    pub headers: HeaderMap,
    /// Service name, signers pick their own default when absent.
    pub service: Option<String>,
    /// Region name, signers derive one from the host when absent.
    pub region: Option<String>,
}

impl SigningRequest {
    /// Create a new signing request with no headers.
    pub fn new(host: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            service: None,
            region: None,
        }
    }

    /// Set the service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the region name.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers.append(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
        Ok(self)
    }

    /// Build a signing request from http::request::Parts.
    ///
    /// Only headers named in `signed_headers` are copied. A named `host` absent
    /// from the headers takes the URI authority. Any other named header that
    /// is absent is kept with an empty value, the signature computed from it
    /// will not match the client's.
    pub fn from_parts(parts: &Parts, signed_headers: &[impl AsRef<str>]) -> Result<Self> {
        let host = match parts.headers.get(HOST) {
            Some(v) => v.to_str()?.to_string(),
            None => parts
                .uri
                .authority()
                .map(|v| v.as_str().to_string())
                .ok_or_else(|| {
                    Error::request_invalid("request without host is invalid for signing")
                        .with_context(format!("uri: {}", parts.uri))
                })?,
        };

        let path = match parts.uri.query() {
            Some(query) => format!("{}?{query}", parts.uri.path()),
            None => parts.uri.path().to_string(),
        };

        let mut headers = HeaderMap::with_capacity(signed_headers.len());
        for name in signed_headers {
            let name = HeaderName::from_bytes(name.as_ref().trim().as_bytes())?;
            let values = parts.headers.get_all(&name);
            if values.iter().next().is_none() {
                // HTTP/2 and absolute-form requests carry host in the authority.
                if name == HOST {
                    headers.insert(HOST, HeaderValue::from_str(&host)?);
                    continue;
                }
                warn!("signed header {name} is absent from request, signing it as empty");
                headers.append(name, HeaderValue::from_static(""));
                continue;
            }
            for value in values {
                headers.append(name.clone(), value.clone());
            }
        }

        Ok(Self {
            host,
            method: parts.method.clone(),
            path,
            headers,
            service: None,
            region: None,
        })
    }

    /// Get the path without query.
    pub fn path_only(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// Get the raw query string if any.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }

    /// Get query pairs decoded, in their original order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query()
            .map(|v| {
                form_urlencoded::parse(v.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get header value by name.
    ///
    /// Returns `None` if header not found.
    pub fn header_get(&self, key: &str) -> Result<Option<&str>> {
        match self.headers.get(key) {
            Some(v) => Ok(Some(v.to_str()?)),
            None => Ok(None),
        }
    }

    /// Get header names as sorted vector, without duplicates.
    pub fn header_name_to_vec_sorted(&self) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();
        h.sort_unstable();
        h.dedup();

        h
    }
}

/// Normalize header value.
///
/// Leading and trailing whitespace is trimmed, inner whitespace runs are
/// collapsed into one space.
pub fn header_value_normalize(v: &str) -> String {
    let mut s = String::with_capacity(v.len());
    for (idx, part) in v.split_whitespace().enumerate() {
        if idx != 0 {
            s.push(' ');
        }
        s.push_str(part);
    }
    s
}
