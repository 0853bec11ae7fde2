//! Configuration for the client core.
//!
//! The core only consumes the settings that feed its algorithms: the signing
//! region, an optional custom endpoint for S3-compatible services, and the
//! multipart sizing knobs. Transport-level settings (timeouts, pooling,
//! retries) belong to the orchestration layer, not here.

use crate::error::{ConfigurationError, S3Error};
use crate::multipart::{MAX_PART_SIZE, MIN_PART_SIZE};
use std::time::Duration;
use url::Url;

/// Configuration for the client core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Signing region (e.g. "us-east-1").
    pub region: String,

    /// Custom endpoint URL (for S3-compatible services).
    pub endpoint: Option<Url>,

    /// Default expiry applied to presigned URLs when the caller gives none.
    pub presign_expiry: Duration,

    /// Objects larger than this use a multipart upload.
    pub multipart_threshold: u64,

    /// Target part size for multipart uploads.
    pub multipart_part_size: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            presign_expiry: Duration::from_secs(7 * 24 * 60 * 60),
            multipart_threshold: 16 * 1024 * 1024, // 16 MiB
            multipart_part_size: 8 * 1024 * 1024,  // 8 MiB
        }
    }
}

impl CoreConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for the core configuration.
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    region: Option<String>,
    endpoint: Option<Url>,
    presign_expiry: Option<Duration>,
    multipart_threshold: Option<u64>,
    multipart_part_size: Option<u64>,
}

impl CoreConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signing region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, S3Error> {
        let url_str = endpoint.into();
        let url = Url::parse(&url_str).map_err(|e| {
            S3Error::Configuration(ConfigurationError::InvalidEndpoint {
                url: url_str,
                details: e.to_string(),
            })
        })?;
        self.endpoint = Some(url);
        Ok(self)
    }

    /// Set a custom endpoint URL (infallible version).
    pub fn endpoint_url(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the default presign expiry.
    pub fn presign_expiry(mut self, expiry: Duration) -> Self {
        self.presign_expiry = Some(expiry);
        self
    }

    /// Set the multipart upload threshold.
    pub fn multipart_threshold(mut self, threshold: u64) -> Self {
        self.multipart_threshold = Some(threshold);
        self
    }

    /// Set the multipart upload part size.
    pub fn multipart_part_size(mut self, size: u64) -> Self {
        self.multipart_part_size = Some(size);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        if let Ok(region) = std::env::var("AWS_REGION") {
            self.region = Some(region);
        } else if let Ok(region) = std::env::var("AWS_DEFAULT_REGION") {
            self.region = Some(region);
        }

        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL_S3") {
            if let Ok(url) = Url::parse(&endpoint) {
                self.endpoint = Some(url);
            }
        } else if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            if let Ok(url) = Url::parse(&endpoint) {
                self.endpoint = Some(url);
            }
        }

        if let Ok(val) = std::env::var("S3_COMPAT_MULTIPART_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                self.multipart_threshold = Some(threshold);
            }
        }
        if let Ok(val) = std::env::var("S3_COMPAT_MULTIPART_PART_SIZE") {
            if let Ok(size) = val.parse() {
                self.multipart_part_size = Some(size);
            }
        }

        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<CoreConfig, S3Error> {
        let defaults = CoreConfig::default();

        let multipart_part_size = self
            .multipart_part_size
            .unwrap_or(defaults.multipart_part_size);

        if multipart_part_size < MIN_PART_SIZE {
            return Err(S3Error::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "multipart_part_size".to_string(),
                    message: format!("Part size must be at least {} bytes", MIN_PART_SIZE),
                },
            ));
        }

        if multipart_part_size > MAX_PART_SIZE {
            return Err(S3Error::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "multipart_part_size".to_string(),
                    message: format!("Part size must not exceed {} bytes", MAX_PART_SIZE),
                },
            ));
        }

        let multipart_threshold = self
            .multipart_threshold
            .unwrap_or(defaults.multipart_threshold);

        if multipart_threshold < MIN_PART_SIZE {
            return Err(S3Error::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "multipart_threshold".to_string(),
                    message: format!("Threshold must be at least {} bytes", MIN_PART_SIZE),
                },
            ));
        }

        Ok(CoreConfig {
            region: self.region.unwrap_or(defaults.region),
            endpoint: self.endpoint,
            presign_expiry: self.presign_expiry.unwrap_or(defaults.presign_expiry),
            multipart_threshold,
            multipart_part_size,
        })
    }
}
