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

use std::fmt::{Debug, Formatter};

use s3k_aws_v4::{Credential, AWS_ACCESS_KEY_ID, AWS_REGION, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN};
use s3k_core::utils::Redact;
use s3k_core::{Context, Error, Result};
use serde::Deserialize;

/// Env value of the object store endpoint, like `http://127.0.0.1:9000`.
pub const S3K_ENDPOINT: &str = "S3K_ENDPOINT";
/// Env value of the default bucket.
pub const S3K_BUCKET: &str = "S3K_BUCKET";
/// Env value of the key prefix.
pub const S3K_PREFIX: &str = "S3K_PREFIX";
/// Env value of the default list delimiter.
pub const S3K_DELIMITER: &str = "S3K_DELIMITER";

/// Config for the s3k client.
///
/// It can be deserialized from a JSON document using camelCase keys:
///
/// ```
/// let config: s3k::Config = serde_json::from_str(
///     r#"{"endpoint": "http://127.0.0.1:9000", "accessKeyId": "ak", "secretAccessKey": "sk", "bucket": "photos"}"#,
/// ).unwrap();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// `endpoint` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`S3K_ENDPOINT`]
    pub endpoint: Option<String>,
    /// `access_key_id` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    pub session_token: Option<String>,
    /// Bucket used when a call doesn't name one.
    ///
    /// Env value: [`S3K_BUCKET`]
    pub bucket: Option<String>,
    /// Prefix prepended to every key and list prefix.
    ///
    /// Env value: [`S3K_PREFIX`]
    pub prefix: Option<String>,
    /// Delimiter used by list calls that don't set one.
    ///
    /// Env value: [`S3K_DELIMITER`]
    pub delimiter: Option<String>,
    /// Signing region, derived from the endpoint host when absent.
    ///
    /// Env value: [`AWS_REGION`]
    pub region: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("delimiter", &self.delimiter)
            .field("region", &self.region)
            .finish()
    }
}

impl Config {
    /// Fill the fields that are still unset from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let load = |field: &mut Option<String>, key: &str| {
            if field.is_none() {
                *field = ctx.env_var(key).filter(|v| !v.is_empty());
            }
        };

        load(&mut self.endpoint, S3K_ENDPOINT);
        load(&mut self.access_key_id, AWS_ACCESS_KEY_ID);
        load(&mut self.secret_access_key, AWS_SECRET_ACCESS_KEY);
        load(&mut self.session_token, AWS_SESSION_TOKEN);
        load(&mut self.bucket, S3K_BUCKET);
        load(&mut self.prefix, S3K_PREFIX);
        load(&mut self.delimiter, S3K_DELIMITER);
        load(&mut self.region, AWS_REGION);
        self
    }

    /// Check that endpoint, access key id and secret access key are set.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("endpoint", &self.endpoint),
            ("accessKeyId", &self.access_key_id),
            ("secretAccessKey", &self.secret_access_key),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().unwrap_or_default().is_empty())
        .map(|(k, _)| k)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            return Ok(());
        }

        Err(Error::config_invalid(
            "s3k requires endpoint, accessKeyId and secretAccessKey",
        )
        .with_context(format!("missing: {}", missing.join(", "))))
    }

    /// Build the signing credential.
    pub(crate) fn credential(&self) -> Result<Credential> {
        self.validate()?;

        let mut cred = Credential::new(
            self.access_key_id.clone().unwrap_or_default(),
            self.secret_access_key.clone().unwrap_or_default(),
        );
        if let Some(token) = &self.session_token {
            cred = cred.with_session_token(token);
        }
        Ok(cred)
    }
}
