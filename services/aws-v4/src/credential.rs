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

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use s3k_core::utils::Redact;
use s3k_core::{Context, Error, Result};

use crate::constants::{AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN, TERMINATOR};

/// Credential that holds the access_key and secret_key.
#[derive(Default, Clone)]
pub struct Credential {
    /// Access key id for aws services.
    pub access_key_id: String,
    /// Secret access key for aws services.
    pub secret_access_key: String,
    /// Session token for aws services.
    pub session_token: Option<String>,
}

impl Credential {
    /// Create a credential from an access key pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token, sent as `x-amz-security-token`.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Load a credential from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// and `AWS_SESSION_TOKEN`.
    ///
    /// Returns `None` unless both keys are set.
    pub fn from_env(ctx: &Context) -> Option<Self> {
        let access_key_id = ctx.env_var(AWS_ACCESS_KEY_ID)?;
        let secret_access_key = ctx.env_var(AWS_SECRET_ACCESS_KEY)?;

        Some(Self {
            access_key_id,
            secret_access_key,
            session_token: ctx.env_var(AWS_SESSION_TOKEN),
        })
    }

    /// Check if both keys are present.
    pub fn is_valid(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .finish()
    }
}

/// The credential part of a v4 signature:
/// `accessKeyId/date/region/service/aws4_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// Access key id.
    pub access_key_id: String,
    /// Date in `%Y%m%d`.
    pub date: String,
    /// Region name.
    pub region: String,
    /// Service name.
    pub service: String,
    /// Always `aws4_request`.
    pub terminator: String,
}

impl CredentialScope {
    /// The scope without the access key: `date/region/service/aws4_request`.
    pub fn scope(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.date, self.region, self.service, self.terminator
        )
    }
}

impl FromStr for CredentialScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [access_key_id, date, region, service, terminator] = parts.as_slice() else {
            return Err(Error::malformed_authorization(
                "credential must have five slash separated parts",
            )
            .with_context(format!("credential: {s}")));
        };

        if *terminator != TERMINATOR {
            return Err(Error::malformed_authorization(format!(
                "credential must end with {TERMINATOR}"
            ))
            .with_context(format!("credential: {s}")));
        }

        Ok(Self {
            access_key_id: access_key_id.to_string(),
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
            terminator: terminator.to_string(),
        })
    }
}

impl Display for CredentialScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.access_key_id, self.scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use s3k_core::{ErrorKind, StaticEnv};
    use std::collections::HashMap;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        let s = format!("{cred:?}");
        assert!(!s.contains("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"));
        assert!(s.contains("wJa***KEY"));
    }

    #[test]
    fn test_credential_from_env() {
        let ctx = Context::new().with_env(StaticEnv {
            envs: HashMap::from_iter([
                (AWS_ACCESS_KEY_ID.to_string(), "access_key_id".to_string()),
                (
                    AWS_SECRET_ACCESS_KEY.to_string(),
                    "secret_access_key".to_string(),
                ),
            ]),
        });
        let cred = Credential::from_env(&ctx).expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "access_key_id");
        assert_eq!(cred.secret_access_key, "secret_access_key");
        assert_eq!(cred.session_token, None);
        assert!(cred.is_valid());

        assert!(Credential::from_env(&Context::new()).is_none());
    }

    #[test]
    fn test_credential_scope_round_trip() {
        let s = "AKIDEXAMPLE/20150830/us-east-1/s3/aws4_request";
        let scope: CredentialScope = s.parse().expect("scope must be valid");
        assert_eq!(scope.access_key_id, "AKIDEXAMPLE");
        assert_eq!(scope.date, "20150830");
        assert_eq!(scope.region, "us-east-1");
        assert_eq!(scope.service, "s3");
        assert_eq!(scope.scope(), "20150830/us-east-1/s3/aws4_request");
        assert_eq!(scope.to_string(), s);
    }

    #[test]
    fn test_credential_scope_invalid() {
        for s in [
            "AKIDEXAMPLE",
            "AKIDEXAMPLE/20150830/us-east-1/s3",
            "AKIDEXAMPLE/20150830/us-east-1/s3/aws3_request",
        ] {
            let err = s.parse::<CredentialScope>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedAuthorization, "{s}");
        }
    }
}
