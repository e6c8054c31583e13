//! Core components shared by the s3k crates.
//!
//! ## Overview
//!
//! - **Error**: one error type with an [`ErrorKind`] that callers can map to
//!   HTTP rejections (400 for malformed authorization, 403 for a bad signature).
//! - **SigningRequest**: the canonical input of signature computation.
//! - **Context**: a container that holds implementations for HTTP sending and
//!   environment access, so the object store never reaches for globals.
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use s3k_core::SigningRequest;
//!
//! let req = SigningRequest::new("examplebucket.s3.amazonaws.com", Method::GET, "/test.txt")
//!     .with_header("range", "bytes=0-9")
//!     .unwrap();
//! assert_eq!(req.path_only(), "/test.txt");
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::ByteStream;
pub use context::Context;
pub use context::Env;
pub use context::HttpSend;
pub use context::NoopEnv;
pub use context::NoopHttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};

mod request;
pub use request::header_value_normalize;
pub use request::SigningRequest;
