//! Amazon S3 configuration.

use serde::{Deserialize, Serialize};

use crate::config::{
    MAX_URL_EXPIRY_SECS, default_region, default_url_expiry_secs, validate_http_url,
};
use crate::error::{StorageError, StorageResult};

/// Signature version supported by the S3 driver.
const SIGNATURE_V4: &str = "v4";

/// Amazon S3 disk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Named AWS profile for the ambient credential chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Key prefix within the bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Public URL root of the bucket; `url` signs requests when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// Lifetime in seconds of URLs returned by `url`.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
    /// Options passed through to the S3 client.
    #[serde(default)]
    pub s3_options: S3ClientOptions,
    /// Logs every backend call.
    #[serde(default)]
    pub debug: bool,
}

/// Client options for S3 and S3-compatible endpoints.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ClientOptions {
    /// Custom endpoint URL (for S3-compatible storage like R2 or Ceph).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Access key ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Request signature version, only `v4` is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_version: Option<String>,
    /// Addresses the bucket as a subdomain instead of a path segment.
    #[serde(default)]
    pub virtual_host_style: bool,
}

impl std::fmt::Debug for S3ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = |value: &Option<String>| value.as_ref().map(|_| "***");

        f.debug_struct("S3ClientOptions")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &masked(&self.access_key_id))
            .field("secret_access_key", &masked(&self.secret_access_key))
            .field("session_token", &masked(&self.session_token))
            .field("signature_version", &self.signature_version)
            .field("virtual_host_style", &self.virtual_host_style)
            .finish()
    }
}

impl S3Config {
    /// Creates a new S3 configuration in the default region.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: default_region(),
            profile: None,
            prefix: None,
            public_url: None,
            url_expiry_secs: default_url_expiry_secs(),
            s3_options: S3ClientOptions::default(),
            debug: false,
        }
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the custom endpoint (for S3-compatible storage).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.s3_options.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.s3_options.access_key_id = Some(access_key_id.into());
        self.s3_options.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the public URL root.
    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = Some(public_url.into());
        self
    }

    /// Sets the lifetime of URLs returned by `url`.
    pub fn with_url_expiry_secs(mut self, secs: u64) -> Self {
        self.url_expiry_secs = secs;
        self
    }

    /// Returns whether both halves of a static key pair are present.
    pub fn has_static_credentials(&self) -> bool {
        self.s3_options.access_key_id.is_some() && self.s3_options.secret_access_key.is_some()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(StorageError::config("`bucket` is required for the s3 driver"));
        }

        if self.region.trim().is_empty() {
            return Err(StorageError::config("`region` cannot be empty"));
        }

        if self.url_expiry_secs == 0 || self.url_expiry_secs > MAX_URL_EXPIRY_SECS {
            return Err(StorageError::config(format!(
                "`urlExpirySecs` must be between 1 and {MAX_URL_EXPIRY_SECS}"
            )));
        }

        if let Some(public_url) = self.public_url.as_deref() {
            validate_http_url("publicUrl", public_url)?;
        }

        let options = &self.s3_options;
        if let Some(endpoint) = options.endpoint.as_deref() {
            validate_http_url("s3Options.endpoint", endpoint)?;
        }

        if options.access_key_id.is_some() != options.secret_access_key.is_some() {
            return Err(StorageError::config(
                "`accessKeyId` and `secretAccessKey` must be set together",
            ));
        }

        if let Some(version) = options.signature_version.as_deref()
            && !version.eq_ignore_ascii_case(SIGNATURE_V4)
        {
            return Err(StorageError::config(format!(
                "signature version `{version}` is not supported, use `{SIGNATURE_V4}`"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults() {
        let config: S3Config = serde_json::from_str(r#"{ "bucket": "docs" }"#).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.url_expiry_secs, 604_800);
        assert!(!config.has_static_credentials());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_client_options() {
        let config: S3Config = serde_json::from_str(
            r#"{
                "bucket": "docs",
                "s3Options": {
                    "endpoint": "https://r2.example.com",
                    "accessKeyId": "AKIA",
                    "secretAccessKey": "secret",
                    "signatureVersion": "V4"
                }
            }"#,
        )
        .unwrap();
        assert!(config.has_static_credentials());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(S3Config::new(" ").validate().is_err());
        assert!(S3Config::new("docs").with_endpoint("ftp://host").validate().is_err());
        assert!(S3Config::new("docs").with_url_expiry_secs(0).validate().is_err());
        assert!(
            S3Config::new("docs")
                .with_url_expiry_secs(604_801)
                .validate()
                .is_err()
        );

        let mut half_keys = S3Config::new("docs");
        half_keys.s3_options.access_key_id = Some("AKIA".into());
        assert!(half_keys.validate().is_err());

        let mut v2 = S3Config::new("docs");
        v2.s3_options.signature_version = Some("v2".into());
        assert!(v2.validate().is_err());
    }
}
