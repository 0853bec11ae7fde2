//! Error types for the S3 client core.
//!
//! Errors are grouped by the subsystem that produces them. Everything in this
//! crate is a synchronous, deterministic computation, so every error here is
//! fatal to the call that produced it; there is no retry logic below the
//! orchestration layer.

use thiserror::Error;

/// Top-level error type for the client core.
#[derive(Debug, Error)]
pub enum S3Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Credential-related errors.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Signature V4 signing errors.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Request descriptor validation errors.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Bucket policy algebra errors.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Multipart planning errors.
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl S3Error {
    /// Returns true if the caller may sensibly continue after this error.
    ///
    /// Policy classification failures are recoverable: the caller can treat
    /// an unclassifiable document as having no policy. Everything else
    /// indicates a bad call site or corrupt remote state.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, S3Error::Policy(e) if e.is_recoverable())
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL '{url}': {details}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Details about the validation error.
        details: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// The configuration field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// Credential-related errors.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No credentials could be found.
    #[error("Credentials not found: no credentials could be loaded from any source")]
    NotFound,

    /// Credentials are invalid.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// Details about why credentials are invalid.
        message: String,
    },

    /// Credentials have expired.
    #[error("Credentials expired: session credentials expired at {expiration}")]
    Expired {
        /// When the credentials expired.
        expiration: String,
    },
}

/// Signature V4 signing errors.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The secret key is empty; a signing key cannot be derived from it.
    #[error("Empty secret key: signing key derivation requires a non-empty secret")]
    EmptySecretKey,

    /// Presign expiry outside the protocol range.
    #[error("Invalid expiry: {seconds}s is outside the allowed range {min}..={max}")]
    InvalidExpiry {
        /// The requested expiry in seconds.
        seconds: u64,
        /// Minimum allowed expiry.
        min: u64,
        /// Maximum allowed expiry.
        max: u64,
    },

    /// A streaming operation was requested against an unsuitable descriptor.
    #[error("Invalid streaming request: {message}")]
    InvalidStreamingRequest {
        /// Details about the misuse.
        message: String,
    },
}

/// Request descriptor validation errors.
///
/// These are construction-time failures: the descriptor never existed, so the
/// signer is never reached with malformed input.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A header name or value contains bytes that cannot be signed.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Reason the header was rejected.
        reason: String,
    },

    /// A query parameter contains bytes that cannot be canonicalized.
    #[error("Invalid query parameter '{key}': {reason}")]
    InvalidQueryParameter {
        /// The offending parameter key.
        key: String,
        /// Reason the parameter was rejected.
        reason: String,
    },

    /// The descriptor has no host, so no `host` header can be signed.
    #[error("Missing host: a request descriptor requires a non-empty host")]
    MissingHost,

    /// A URL could not be assembled from the descriptor.
    #[error("Invalid URL: {message}")]
    InvalidUrl {
        /// Parse error detail.
        message: String,
    },
}

/// Bucket policy algebra errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The document contains a Deny statement touching this bucket.
    ///
    /// The coarse Read/Write classification does not model Deny semantics.
    /// Callers may treat the bucket as having no policy, or escalate.
    #[error("Deny statement present for bucket '{bucket}': not modeled by classification")]
    DenyNotModeled {
        /// The bucket whose statements include a Deny.
        bucket: String,
    },

    /// The document version is not the statement-model version.
    #[error("Unsupported policy version '{version}'")]
    UnsupportedVersion {
        /// The version string found in the document.
        version: String,
    },

    /// The document could not be parsed as a policy.
    #[error("Malformed policy document: {message}")]
    MalformedDocument {
        /// Parse error detail.
        message: String,
    },

    /// A canned ACL with no statement-model equivalent.
    #[error("Unsupported canned ACL '{acl}'")]
    UnsupportedAcl {
        /// The ACL name.
        acl: String,
    },
}

impl PolicyError {
    /// Returns true if the caller can fall back to treating the document
    /// as having no policy.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PolicyError::DenyNotModeled { .. } | PolicyError::UnsupportedVersion { .. }
        )
    }
}

/// Multipart planning errors.
#[derive(Debug, Error)]
pub enum MultipartError {
    /// The object exceeds the protocol's maximum size.
    #[error("Object too large: {size} bytes exceeds maximum of {max_size} bytes")]
    ObjectTooLarge {
        /// The object size.
        size: u64,
        /// Maximum allowed size.
        max_size: u64,
    },

    /// A remote part's recorded size contradicts the planned byte range.
    ///
    /// The resume attempt is aborted entirely; mixing stale and fresh parts
    /// would corrupt the assembled object.
    #[error(
        "Resume integrity failure at part {part_number}: planned {planned_size} bytes, \
         server recorded {recorded_size} bytes"
    )]
    ResumeIntegrity {
        /// The part number with the contradiction.
        part_number: u32,
        /// The byte length the plan assigns to this part.
        planned_size: u64,
        /// The byte length the server recorded.
        recorded_size: u64,
    },

    /// A part number outside the protocol range.
    #[error("Invalid part number {part_number}: must be within 1..={max}")]
    InvalidPartNumber {
        /// The offending part number.
        part_number: u32,
        /// Maximum allowed part number.
        max: u64,
    },

    /// Completion requested with parts missing.
    #[error("Incomplete upload: part {missing_part} has no server-confirmed ETag")]
    IncompleteUpload {
        /// The first missing part number.
        missing_part: u32,
    },

    /// An operation was attempted in a session state that does not permit it.
    #[error("Invalid session transition: cannot {attempted} while {state}")]
    InvalidTransition {
        /// The session state at the time.
        state: String,
        /// The attempted operation.
        attempted: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_errors_are_recoverable() {
        let deny = S3Error::Policy(PolicyError::DenyNotModeled {
            bucket: "logs".into(),
        });
        assert!(deny.is_recoverable());

        let malformed = S3Error::Policy(PolicyError::MalformedDocument {
            message: "unexpected token".into(),
        });
        assert!(!malformed.is_recoverable());
    }

    #[test]
    fn test_construction_errors_are_fatal() {
        let expiry = S3Error::Signing(SigningError::InvalidExpiry {
            seconds: 0,
            min: 1,
            max: 604_800,
        });
        assert!(!expiry.is_recoverable());

        let header = S3Error::Request(RequestError::InvalidHeader {
            name: "x-amz-meta-bad".into(),
            reason: "control byte in value".into(),
        });
        assert!(!header.is_recoverable());
    }

    #[test]
    fn test_error_display_names_the_offending_value() {
        let err = SigningError::InvalidExpiry {
            seconds: 604_801,
            min: 1,
            max: 604_800,
        };
        let text = err.to_string();
        assert!(text.contains("604801"));
        assert!(text.contains("604800"));
    }

    #[test]
    fn test_resume_integrity_display() {
        let err = MultipartError::ResumeIntegrity {
            part_number: 3,
            planned_size: 5_242_880,
            recorded_size: 4_000_000,
        };
        let text = err.to_string();
        assert!(text.contains("part 3"));
        assert!(text.contains("5242880"));
    }
}
