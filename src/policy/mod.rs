//! Bucket policy statement algebra.
//!
//! Models the subset of the policy language that anonymous-access tooling
//! manipulates: wildcard-principal `Allow` statements over bucket and
//! object-prefix resources. [`classify`] reads the access level a document
//! grants to a (bucket, prefix) pair and [`set_policy`] rewrites a document
//! to grant exactly a requested level without disturbing other grants.

mod acl;
mod algebra;
mod document;

pub use acl::CannedAcl;
pub use algebra::{classify, set_policy};
pub use document::{
    bucket_arn, object_arn, BucketPolicyDocument, Conditions, Effect, PolicyStatement, Principal,
    POLICY_VERSION,
};

use serde::{Deserialize, Serialize};

/// Access level a policy grants to anonymous callers of a (bucket, prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketAccess {
    /// No anonymous access.
    None,
    /// Anonymous download and listing.
    ReadOnly,
    /// Anonymous upload and deletion, no download.
    WriteOnly,
    /// Full anonymous access.
    ReadWrite,
}

impl std::fmt::Display for BucketAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BucketAccess::None => "none",
            BucketAccess::ReadOnly => "read-only",
            BucketAccess::WriteOnly => "write-only",
            BucketAccess::ReadWrite => "read-write",
        };
        f.write_str(label)
    }
}
