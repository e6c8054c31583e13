//! AWS Signature Version 4 codec.
//!
//! - [`parse_authorization_header`] and [`parse_authorization_query`] extract
//!   the authorization material of a signed request.
//! - [`RequestSigner`] computes v4 signatures in headers or in the query string.
//! - [`RequestVerifier`] authenticates inbound requests against a
//!   [`CredentialStore`].
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use s3k_aws_v4::{Credential, RequestSigner};
//! use s3k_core::SigningRequest;
//!
//! let signer = RequestSigner::new(Credential::new("AKIDEXAMPLE", "secret"));
//! let mut req = SigningRequest::new("examplebucket.s3.amazonaws.com", Method::GET, "/test.txt");
//! let headers = signer.sign_headers(&mut req).unwrap();
//! assert!(headers.contains_key("authorization"));
//! ```

mod authorization;
pub use authorization::parse_authorization_header;
pub use authorization::parse_authorization_query;
pub use authorization::AuthorizationMaterial;
pub use authorization::QueryInput;
pub use authorization::SigningVersion;

mod constants;
pub use constants::{
    AWS_ACCESS_KEY_ID, AWS_QUERY_ENCODE_SET, AWS_REGION, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN,
    AWS_URI_ENCODE_SET, DEFAULT_REGION, DEFAULT_SERVICE, EMPTY_STRING_SHA256, UNSIGNED_PAYLOAD,
    X_AMZ_CONTENT_SHA_256,
};

mod credential;
pub use credential::Credential;
pub use credential::CredentialScope;

mod sign_request;
pub use sign_request::RequestSigner;

mod verify;
pub use verify::CredentialStore;
pub use verify::RequestVerifier;
pub use verify::StaticCredentialStore;
