// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashMap;
use std::fmt::Debug;

use http::header::AUTHORIZATION;
use http::request::Parts;
use log::debug;
use s3k_core::{Error, Result, SigningRequest};
use subtle::ConstantTimeEq;

use crate::authorization::{parse_authorization_header, parse_authorization_query};
use crate::constants::{X_AMZ_ALGORITHM_QUERY, X_AMZ_SIGNATURE_QUERY};
use crate::sign_request::strip_signature;
use crate::{AuthorizationMaterial, Credential, QueryInput, RequestSigner};

/// Look up the credential of an access key id.
pub trait CredentialStore: Debug + Send + Sync + 'static {
    /// Return the credential for `access_key_id`, or `None` if it's unknown.
    fn credential(&self, access_key_id: &str) -> Option<Credential>;
}

/// An in-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    credentials: HashMap<String, Credential>,
}

impl StaticCredentialStore {
    /// Create a store from `(access_key_id, secret_access_key)` pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials
                .into_iter()
                .map(|(ak, sk)| (ak.clone(), Credential::new(ak, sk)))
                .collect(),
        }
    }

    /// Add a credential to the store.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credentials
            .insert(credential.access_key_id.clone(), credential);
        self
    }
}

impl CredentialStore for StaticCredentialStore {
    fn credential(&self, access_key_id: &str) -> Option<Credential> {
        self.credentials.get(access_key_id).cloned()
    }
}

/// RequestVerifier authenticates inbound SigV4 requests.
///
/// The signature is recomputed over the headers the client signed, with the
/// region and service of the client's credential scope, then compared in
/// constant time. `X-Amz-Expires` is not enforced.
#[derive(Debug)]
pub struct RequestVerifier<S: CredentialStore> {
    store: S,
}

impl<S: CredentialStore> RequestVerifier<S> {
    /// Create a verifier backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Verify the request, and return its authorization material.
    ///
    /// The `Authorization` header is used when present, otherwise the query
    /// string must carry a presigned signature.
    pub fn verify(&self, parts: &Parts) -> Result<AuthorizationMaterial> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|v| v.to_str())
            .transpose()?;
        let query = parts.uri.query().unwrap_or_default();

        if header.is_none() && has_query_authorization(query) {
            self.verify_query(parts, query)
        } else {
            self.verify_header(parts, header)
        }
    }

    fn verify_header(&self, parts: &Parts, header: Option<&str>) -> Result<AuthorizationMaterial> {
        let material = parse_authorization_header(header)?;
        let (signer, mut req) = self.prepare(parts, &material)?;

        let headers = signer.sign_headers(&mut req)?;
        let authorization = headers
            .get(AUTHORIZATION)
            .map(|v| v.to_str())
            .transpose()?;
        let expected = parse_authorization_header(authorization)?;

        check_signature(&material, &expected.signature)?;
        Ok(material)
    }

    fn verify_query(&self, parts: &Parts, query: &str) -> Result<AuthorizationMaterial> {
        let material = parse_authorization_query(QueryInput::Raw(query))?;
        let (signer, mut req) = self.prepare(parts, &material)?;

        strip_signature(&mut req);
        let signed = signer.sign_query_string(&mut req)?;
        let expected = signed.get(X_AMZ_SIGNATURE_QUERY).ok_or_else(|| {
            Error::unexpected("signed query string has no signature")
                .with_context(format!("path: {}", req.path))
        })?;

        check_signature(&material, expected)?;
        Ok(material)
    }

    fn prepare(
        &self,
        parts: &Parts,
        material: &AuthorizationMaterial,
    ) -> Result<(RequestSigner, SigningRequest)> {
        let scope = material.scope()?;
        let credential = self
            .store
            .credential(&material.access_key_id)
            .ok_or_else(|| {
                Error::credential_invalid("access key id is unknown")
                    .with_context(format!("access_key_id: {}", material.access_key_id))
            })?;
        debug!(
            "verifying request of {} with scope {}",
            material.access_key_id,
            scope.scope()
        );

        let req = SigningRequest::from_parts(parts, &material.signed_headers)?
            .with_region(scope.region)
            .with_service(scope.service);

        Ok((RequestSigner::new(credential), req))
    }
}

fn has_query_authorization(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes()).any(|(k, _)| k == X_AMZ_ALGORITHM_QUERY)
}

fn check_signature(material: &AuthorizationMaterial, expected: &str) -> Result<()> {
    let provided = material.signature.as_bytes();
    if provided.ct_eq(expected.as_bytes()).into() {
        return Ok(());
    }

    Err(Error::signature_mismatch(
        "request signature does not match the computed signature",
    )
    .with_context(format!("access_key_id: {}", material.access_key_id)))
}
