//! Canonical request building for Signature V4.
//!
//! Canonicalization is a pure function of its inputs: two calls with
//! identical inputs always yield byte-identical strings. That determinism is
//! what makes signatures testable and presigned URLs reproducible for a
//! fixed timestamp.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::{BTreeMap, BTreeSet};

/// Characters that are NOT percent-encoded anywhere: the unreserved set.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URI-encode one path segment or query component.
///
/// Space becomes `%20`, never `+`.
pub fn uri_encode_query(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// URI-encode a path, encoding each segment independently.
///
/// `/` is a separator, never re-escaped; a literal `/` inside an object key
/// therefore stays a separator in the canonical URI.
pub fn uri_encode_path(path: &str) -> String {
    let normalized = if path.starts_with('/') {
        path
    } else {
        return uri_encode_path(&format!("/{}", path));
    };

    normalized
        .split('/')
        .map(uri_encode_query)
        .collect::<Vec<_>>()
        .join("/")
}

/// A canonical request plus the signed-header list the signer reuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// The newline-joined canonical request string.
    pub text: String,
    /// Semicolon-joined, sorted, lower-cased signed header names.
    pub signed_headers: String,
}

impl CanonicalRequest {
    /// Build the canonical request.
    ///
    /// Format:
    /// ```text
    /// HTTPMethod\n
    /// CanonicalURI\n
    /// CanonicalQueryString\n
    /// CanonicalHeaders\n
    /// SignedHeaders\n
    /// HashedPayload
    /// ```
    ///
    /// `headers` is the full multimap destined for the wire; headers on the
    /// skip list (see [`super::should_sign_header`]) are excluded here and
    /// from the signed-header list.
    pub fn build(
        method: &str,
        path: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        payload_hash: &str,
    ) -> Self {
        let canonical_uri = uri_encode_path(path);
        let canonical_query = canonical_query_string(query);
        let (canonical_headers, signed_headers) = canonical_headers(headers);

        let text = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.to_uppercase(),
            canonical_uri,
            canonical_query,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        Self {
            text,
            signed_headers,
        }
    }
}

/// Build the canonical query string from a parameter multimap.
///
/// Pairs are encoded, then sorted by encoded key and encoded value; the
/// stable sort preserves the relative order of identical pairs.
pub fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode_query(k), uri_encode_query(v)))
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers block and the signed-header list.
///
/// Names are lower-cased and sorted; values are trimmed with internal
/// whitespace collapsed; repeated names are comma-joined in input order.
/// The block ends with the blank line required before the signed-header
/// list.
fn canonical_headers(headers: &[(String, String)]) -> (String, String) {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut names: BTreeSet<String> = BTreeSet::new();

    for (name, value) in headers {
        let name_lower = name.to_lowercase();
        if !super::should_sign_header(&name_lower) {
            continue;
        }

        let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");

        header_map.entry(name_lower.clone()).or_default().push(trimmed);
        names.insert(name_lower);
    }

    let block: String = header_map
        .iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect();

    let signed = names.into_iter().collect::<Vec<_>>().join(";");

    (block, signed)
}
