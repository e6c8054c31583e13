use std::fmt;
use thiserror::Error;

/// The error type for s3k operations
#[derive(Error, Debug)]
#[error("{}", format_message(.message, .context))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    context: Vec<String>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No authorization header, or no `X-Amz-Algorithm` in the query string.
    MissingAuthorization,

    /// Signing scheme is recognized but not supported (v1, v2 and v3).
    UnsupportedSigningVersion,

    /// Signing scheme prefix is not recognized at all.
    UnknownSigningType,

    /// V4 scheme without the required `Credential`, `SignedHeaders` or `Signature` parts.
    MalformedAuthorization,

    /// Access key is unknown or its credential can't be used.
    CredentialInvalid,

    /// Recomputed signature doesn't match the one supplied by the client.
    SignatureMismatch,

    /// Request cannot be signed (missing host, bad timestamp, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// The storage service answered with an error document.
    ServiceError,

    /// Unexpected errors (network, I/O, decoding, etc.)
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: Vec::new(),
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a piece of context, like the bucket or key involved.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the context attached to this error.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Look for a typed source, e.g. a service error document.
    pub fn source_as<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source.as_ref()?.downcast_ref::<E>()
    }

    /// Check if this error comes from parsing the client's authorization material.
    ///
    /// Those are caller input problems and usually map to `400 Bad Request`.
    pub fn is_authorization_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MissingAuthorization
                | ErrorKind::UnsupportedSigningVersion
                | ErrorKind::UnknownSigningType
                | ErrorKind::MalformedAuthorization
        )
    }

    /// Check if the request was well-formed but not authenticated.
    ///
    /// Those usually map to `403 Forbidden`.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CredentialInvalid | ErrorKind::SignatureMismatch
        )
    }
}

fn format_message(message: &str, context: &[String]) -> String {
    if context.is_empty() {
        return message.to_string();
    }

    format!("{message} ({})", context.join(", "))
}

// Convenience constructors
impl Error {
    /// Create a missing authorization error
    pub fn missing_authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingAuthorization, message)
    }

    /// Create an unsupported signing version error
    pub fn unsupported_signing_version(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedSigningVersion, message)
    }

    /// Create an unknown signing type error
    pub fn unknown_signing_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownSigningType, message)
    }

    /// Create a malformed authorization error
    pub fn malformed_authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedAuthorization, message)
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a signature mismatch error
    pub fn signature_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureMismatch, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a service error
    pub fn service_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceError, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingAuthorization => write!(f, "missing authorization"),
            ErrorKind::UnsupportedSigningVersion => write!(f, "unsupported signing version"),
            ErrorKind::UnknownSigningType => write!(f, "unknown signing type"),
            ErrorKind::MalformedAuthorization => write!(f, "malformed authorization"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::SignatureMismatch => write!(f, "signature mismatch"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::ServiceError => write!(f, "service error"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
