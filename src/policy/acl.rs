//! Canned ACL names and their policy equivalents.

use super::BucketAccess;
use crate::error::PolicyError;
use std::fmt;
use std::str::FromStr;

/// The canned ACLs with a policy-algebra equivalent.
///
/// `authenticated-read` and grant-based ACLs have no wildcard-principal
/// counterpart and are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    /// Owner-only access.
    Private,
    /// Anonymous read access.
    PublicRead,
    /// Anonymous read and write access.
    PublicReadWrite,
}

impl CannedAcl {
    /// The access level this ACL corresponds to.
    pub fn access(self) -> BucketAccess {
        match self {
            CannedAcl::Private => BucketAccess::None,
            CannedAcl::PublicRead => BucketAccess::ReadOnly,
            CannedAcl::PublicReadWrite => BucketAccess::ReadWrite,
        }
    }
}

impl FromStr for CannedAcl {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, PolicyError> {
        match s {
            "private" => Ok(CannedAcl::Private),
            "public-read" => Ok(CannedAcl::PublicRead),
            "public-read-write" => Ok(CannedAcl::PublicReadWrite),
            other => Err(PolicyError::UnsupportedAcl {
                acl: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
        };
        f.write_str(name)
    }
}
