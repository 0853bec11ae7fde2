//! The structured request descriptor consumed by the signer.
//!
//! Endpoint resolution and operation-specific argument building happen in the
//! layers above; the signer only sees this descriptor. Header and query
//! validation happens here, at construction time, so canonicalization can
//! assume well-formed input.

use crate::error::{RequestError, S3Error};
use bytes::Bytes;

/// The request payload, as far as signing is concerned.
#[derive(Debug, Clone)]
pub enum Payload {
    /// No body; hashes as the empty string.
    Empty,
    /// In-memory body; hashed with SHA-256.
    Bytes(Bytes),
    /// Body intentionally left unhashed (presigned URLs).
    Unsigned,
    /// Chunked streaming upload of a known decoded length.
    Streaming {
        /// Total payload length before chunk framing.
        decoded_length: u64,
    },
}

/// A logical HTTP request: everything the signer needs, nothing it doesn't.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: String,
    scheme: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    payload: Payload,
}

impl RequestDescriptor {
    /// Create a descriptor for `method` against `host` and the un-encoded
    /// `path` (a leading `/` is added if missing).
    pub fn new(
        method: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, S3Error> {
        let host = host.into();
        if host.is_empty() {
            return Err(S3Error::Request(RequestError::MissingHost));
        }

        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };

        Ok(Self {
            method: method.into().to_uppercase(),
            scheme: "https".to_string(),
            host,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            payload: Payload::Empty,
        })
    }

    /// Override the URL scheme (defaults to `https`).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Append a query parameter. Repeated keys are allowed.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self, S3Error> {
        let key = key.into();
        let value = value.into();
        if let Some(reason) = text_rejection(&key).or_else(|| text_rejection(&value)) {
            return Err(S3Error::Request(RequestError::InvalidQueryParameter {
                key,
                reason,
            }));
        }
        self.query.push((key, value));
        Ok(self)
    }

    /// Append a header. Repeated names are allowed and will be comma-joined
    /// during canonicalization.
    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, S3Error> {
        let name = name.into();
        let value = value.into();

        if name.is_empty() || !name.bytes().all(is_header_name_byte) {
            return Err(S3Error::Request(RequestError::InvalidHeader {
                name,
                reason: "header names must be non-empty ASCII tokens".to_string(),
            }));
        }
        if let Some(reason) = text_rejection(&value) {
            return Err(S3Error::Request(RequestError::InvalidHeader {
                name,
                reason,
            }));
        }

        self.headers.push((name, value));
        Ok(self)
    }

    /// Set the request payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Set an in-memory body.
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        self.with_payload(Payload::Bytes(body.into()))
    }

    /// The HTTP method, upper-cased.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The URL scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host (with port, if any).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The un-encoded absolute path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query parameter multimap, in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The header multimap, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The request payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

// Header names: RFC 7230 tokens, restricted to the characters S3 actually
// uses. Values: visible ASCII plus space and tab; anything else cannot
// survive canonicalization unambiguously.

fn is_header_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.'
}

fn text_rejection(s: &str) -> Option<String> {
    for b in s.bytes() {
        if b == 0 {
            return Some("null byte".to_string());
        }
        if b < 0x20 && b != b'\t' {
            return Some(format!("control byte 0x{:02x}", b));
        }
        if b == 0x7f {
            return Some("DEL byte".to_string());
        }
    }
    None
}
