use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use log::debug;
use s3k_core::time::{parse_iso8601, DateTime};
use s3k_core::{Error, Result};

use crate::constants::{
    AWS_ACCESS_KEY_ID_QUERY, SIGNATURE_QUERY, X_AMZ_ALGORITHM_QUERY, X_AMZ_CREDENTIAL_QUERY,
    X_AMZ_DATE_QUERY, X_AMZ_EXPIRES_QUERY, X_AMZ_SIGNATURE_QUERY, X_AMZ_SIGNED_HEADERS_QUERY,
};
use crate::CredentialScope;

/// Signing scheme identifiers.
///
/// Only [`SigningVersion::Aws4`] is ever computed, the older ones are
/// recognized so they can be rejected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningVersion {
    /// `AWS`, signature version 1.
    Aws,
    /// `AWS2`
    Aws2,
    /// `AWS3`
    Aws3,
    /// `AWS4`
    Aws4,
}

impl SigningVersion {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "AWS" => Some(Self::Aws),
            "AWS2" => Some(Self::Aws2),
            "AWS3" => Some(Self::Aws3),
            "AWS4" => Some(Self::Aws4),
            _ => None,
        }
    }
}

impl Display for SigningVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningVersion::Aws => write!(f, "AWS"),
            SigningVersion::Aws2 => write!(f, "AWS2"),
            SigningVersion::Aws3 => write!(f, "AWS3"),
            SigningVersion::Aws4 => write!(f, "AWS4"),
        }
    }
}

/// Authorization material carried by a signed request, either in its
/// `Authorization` header or in its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationMaterial {
    /// Signing scheme, always [`SigningVersion::Aws4`].
    pub version: SigningVersion,
    /// Full scheme token, like `AWS4-HMAC-SHA256`.
    pub algorithm: String,
    /// Raw credential: `accessKeyId/date/region/service/aws4_request`.
    pub credential: String,
    /// Access key id that signed the request.
    pub access_key_id: String,
    /// Signed header names, in the order given by the client.
    pub signed_headers: Vec<String>,
    /// Hex encoded signature.
    pub signature: String,
    /// `X-Amz-Date` of a presigned request.
    pub date: Option<DateTime>,
    /// `X-Amz-Expires` of a presigned request, never enforced.
    pub expires: Option<Duration>,
}

impl AuthorizationMaterial {
    /// Parse the credential into its scope.
    pub fn scope(&self) -> Result<CredentialScope> {
        self.credential.parse()
    }
}

/// Query input of [`parse_authorization_query`].
#[derive(Debug, Clone)]
pub enum QueryInput<'a> {
    /// Raw query string, without the leading `?`.
    Raw(&'a str),
    /// Already decoded query parameters.
    Decoded(HashMap<String, String>),
}

impl QueryInput<'_> {
    /// Normalize into decoded parameters.
    ///
    /// For repeated keys in a raw query, the first value wins.
    pub fn into_map(self) -> HashMap<String, String> {
        match self {
            QueryInput::Raw(query) => {
                let query = query.strip_prefix('?').unwrap_or(query);
                let mut map = HashMap::new();
                for (k, v) in form_urlencoded::parse(query.as_bytes()) {
                    map.entry(k.into_owned()).or_insert_with(|| v.into_owned());
                }
                map
            }
            QueryInput::Decoded(map) => map,
        }
    }
}

impl<'a> From<&'a str> for QueryInput<'a> {
    fn from(query: &'a str) -> Self {
        QueryInput::Raw(query)
    }
}

impl From<HashMap<String, String>> for QueryInput<'_> {
    fn from(query: HashMap<String, String>) -> Self {
        QueryInput::Decoded(query)
    }
}

/// Parse the value of an `Authorization` header.
///
/// ```
/// use s3k_aws_v4::parse_authorization_header;
///
/// let material = parse_authorization_header(Some(
///     "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/s3/aws4_request, SignedHeaders=host;x-amz-date, Signature=abcd1234",
/// ))
/// .unwrap();
/// assert_eq!(material.access_key_id, "AKIDEXAMPLE");
/// assert_eq!(material.signed_headers, vec!["host", "x-amz-date"]);
/// ```
pub fn parse_authorization_header(header: Option<&str>) -> Result<AuthorizationMaterial> {
    let header = match header {
        Some(v) if !v.is_empty() => v,
        _ => return Err(Error::missing_authorization("no authorization header")),
    };

    let (algorithm, version) = leading_token(header).ok_or_else(|| {
        Error::unknown_signing_type("unknown authorization header")
            .with_context(format!("header: {header}"))
    })?;
    debug!("authorization header type: {algorithm}, version: {version}");

    match SigningVersion::from_token(version) {
        Some(SigningVersion::Aws4) => {}
        Some(v) => {
            return Err(Error::unsupported_signing_version(format!(
                "{v} authorization header not supported"
            )))
        }
        None => {
            return Err(Error::unknown_signing_type(format!(
                "unknown authorization header type: {algorithm}"
            )))
        }
    }

    let (Some(credential), Some(signed_headers), Some(signature)) = (
        capture_field(header, "Credential="),
        capture_field(header, "SignedHeaders="),
        capture_field(header, "Signature="),
    ) else {
        return Err(Error::malformed_authorization(
            "bad AWS v4 authorization header",
        ));
    };

    Ok(AuthorizationMaterial {
        version: SigningVersion::Aws4,
        algorithm: algorithm.to_string(),
        credential: credential.to_string(),
        access_key_id: first_segment(credential).to_string(),
        signed_headers: split_signed_headers(signed_headers),
        signature: signature.to_string(),
        date: None,
        expires: None,
    })
}

/// Parse the authorization material of a presigned request.
///
/// ```
/// use s3k_aws_v4::{parse_authorization_query, QueryInput};
///
/// let material = parse_authorization_query(QueryInput::Raw(
///     "X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Credential=AKID%2F20150830%2Fus-east-1%2Fs3%2Faws4_request&X-Amz-SignedHeaders=host&X-Amz-Signature=abcd",
/// ))
/// .unwrap();
/// assert_eq!(material.access_key_id, "AKID");
/// ```
pub fn parse_authorization_query(query: QueryInput<'_>) -> Result<AuthorizationMaterial> {
    let mut query = query.into_map();

    let algorithm = match query.remove(X_AMZ_ALGORITHM_QUERY) {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(Error::missing_authorization(
                "no authorization in query string",
            ))
        }
    };
    let version = algorithm.split('-').next().unwrap_or_default();
    debug!("authorization query type: {algorithm}, version: {version}");

    match SigningVersion::from_token(version) {
        Some(SigningVersion::Aws4) => {}
        Some(v) => {
            return Err(Error::unsupported_signing_version(format!(
                "{v} authorization query string not supported"
            )))
        }
        None => {
            return Err(Error::unknown_signing_type(format!(
                "unknown authorization query string type: {algorithm}"
            )))
        }
    }

    let credential = non_empty(query.remove(X_AMZ_CREDENTIAL_QUERY));
    let signed_headers = non_empty(query.remove(X_AMZ_SIGNED_HEADERS_QUERY));
    let signature = non_empty(query.remove(X_AMZ_SIGNATURE_QUERY))
        .or_else(|| non_empty(query.remove(SIGNATURE_QUERY)));
    let (Some(credential), Some(signed_headers), Some(signature)) =
        (credential, signed_headers, signature)
    else {
        return Err(Error::malformed_authorization(
            "bad AWS v4 authorization query string",
        ));
    };

    let access_key_id = non_empty(query.remove(AWS_ACCESS_KEY_ID_QUERY))
        .unwrap_or_else(|| first_segment(&credential).to_string());
    let date = query
        .get(X_AMZ_DATE_QUERY)
        .and_then(|v| parse_iso8601(v).ok());
    let expires = query
        .get(X_AMZ_EXPIRES_QUERY)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);

    Ok(AuthorizationMaterial {
        version: SigningVersion::Aws4,
        algorithm,
        access_key_id,
        signed_headers: split_signed_headers(&signed_headers),
        credential,
        signature,
        date,
        expires,
    })
}

/// Leading `<version>[-<rest>]` token of an authorization header, returned
/// as `(type, version)`.
fn leading_token(header: &str) -> Option<(&str, &str)> {
    let version_end = header
        .find(|c: char| c == ' ' || c == '-')
        .unwrap_or(header.len());
    if version_end == 0 {
        return None;
    }
    let version = &header[..version_end];

    let rest = &header[version_end..];
    let type_end = match rest.strip_prefix('-') {
        Some(tail) if !tail.is_empty() && !tail.starts_with(' ') => {
            version_end + 1 + tail.find(' ').unwrap_or(tail.len())
        }
        _ => version_end,
    };

    Some((&header[..type_end], version))
}

/// Find the first `<name><value>` in header whose value is not empty, the
/// value runs until the next `,`.
fn capture_field<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.match_indices(name).find_map(|(idx, _)| {
        let tail = &header[idx + name.len()..];
        let value = &tail[..tail.find(',').unwrap_or(tail.len())];
        (!value.is_empty()).then_some(value)
    })
}

fn first_segment(credential: &str) -> &str {
    credential.split('/').next().unwrap_or_default()
}

fn split_signed_headers(signed_headers: &str) -> Vec<String> {
    signed_headers.split(';').map(|v| v.to_string()).collect()
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|v| !v.is_empty())
}
