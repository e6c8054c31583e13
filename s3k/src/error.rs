use http::{HeaderMap, StatusCode};
use quick_xml::de;
use s3k_core::Error;
use serde::Deserialize;

/// The error document of a non-2xx response.
///
/// It's attached as the source of an [`ErrorKind::ServiceError`](s3k_core::ErrorKind::ServiceError)
/// error, use [`Error::source_as`] to get it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message} (status: {status}, request_id: {request_id})")]
pub struct ServiceError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Error code like `NoSuchKey`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Bucket or object the error is about.
    pub resource: String,
    /// Request id assigned by the service.
    pub request_id: String,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorDocument {
    code: String,
    message: String,
    resource: String,
    request_id: String,
}

/// Build the error of a non-2xx response.
///
/// Responses without a parsable error document, like the ones of `HEAD`,
/// get a code derived from the status.
pub(crate) fn parse_service_error(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Error {
    let doc: ErrorDocument = de::from_str(&String::from_utf8_lossy(body)).unwrap_or_default();

    let code = if doc.code.is_empty() {
        status_code_name(status)
    } else {
        doc.code
    };
    let request_id = if doc.request_id.is_empty() {
        headers
            .get("x-amz-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    } else {
        doc.request_id
    };

    let err = ServiceError {
        status,
        code,
        message: doc.message,
        resource: doc.resource,
        request_id,
    };
    Error::service_error(format!("object store responded {}", err.code)).with_source(err)
}

fn status_code_name(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "NotFound".to_string(),
        StatusCode::FORBIDDEN => "Forbidden".to_string(),
        StatusCode::BAD_REQUEST => "BadRequest".to_string(),
        _ => status
            .canonical_reason()
            .map(|v| v.replace(' ', ""))
            .unwrap_or_else(|| status.as_str().to_string()),
    }
}
