//! Bucket policy document model.
//!
//! Mirrors the JSON shape S3-compatible servers accept: a version string and
//! a list of statements, where `Action`, `Resource` and principal values may
//! appear as either a single string or an array of strings.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The only policy language version this crate understands.
pub const POLICY_VERSION: &str = "2012-10-17";

/// ARN prefix for S3 resources.
pub const ARN_PREFIX: &str = "arn:aws:s3:::";

/// Condition map: operator -> key -> set of values.
///
/// Ordered maps and sets keep serialization stable, which makes statement
/// equality and merging well-defined.
pub type Conditions = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// The statement grants its actions.
    Allow,
    /// The statement forbids its actions.
    Deny,
}

/// Statement principal: the wildcard, or an explicit set of AWS principals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// `"Principal": "*"` or `{"AWS": ["*"]}`.
    Wildcard,
    /// Explicit principal ARNs.
    Aws(BTreeSet<String>),
}

impl Principal {
    /// True for `"*"` in either spelling.
    pub fn is_wildcard(&self) -> bool {
        match self {
            Principal::Wildcard => true,
            Principal::Aws(set) => set.len() == 1 && set.contains("*"),
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Principal::Wildcard => serializer.serialize_str("*"),
            Principal::Aws(set) => {
                #[derive(Serialize)]
                struct AwsPrincipal<'a> {
                    #[serde(rename = "AWS")]
                    aws: &'a BTreeSet<String>,
                }
                AwsPrincipal { aws: set }.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PrincipalVisitor;

        impl<'de> Visitor<'de> for PrincipalVisitor {
            type Value = Principal;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"*\" or {\"AWS\": ...}")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Principal, E> {
                if v == "*" {
                    Ok(Principal::Wildcard)
                } else {
                    Ok(Principal::Aws(BTreeSet::from([v.to_string()])))
                }
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Principal, A::Error> {
                let mut aws: Option<StringSet> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "AWS" {
                        aws = Some(map.next_value()?);
                    } else {
                        let _: serde::de::IgnoredAny = map.next_value()?;
                    }
                }
                let set = aws.map(|s| s.0).unwrap_or_default();
                if set.len() == 1 && set.contains("*") {
                    Ok(Principal::Wildcard)
                } else {
                    Ok(Principal::Aws(set))
                }
            }
        }

        deserializer.deserialize_any(PrincipalVisitor)
    }
}

/// A string set that deserializes from either a single string or an array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StringSet(BTreeSet<String>);

impl Serialize for StringSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.len() == 1 {
            serializer.serialize_str(self.0.iter().next().unwrap())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for StringSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = StringSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or an array of strings")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StringSet, E> {
                Ok(StringSet(BTreeSet::from([v.to_string()])))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StringSet, A::Error> {
                let mut set = BTreeSet::new();
                while let Some(v) = seq.next_element::<String>()? {
                    set.insert(v);
                }
                Ok(StringSet(set))
            }
        }

        deserializer.deserialize_any(SetVisitor)
    }
}

fn serialize_set<S: Serializer>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
    StringSet(set.clone()).serialize(serializer)
}

fn deserialize_set<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeSet<String>, D::Error> {
    StringSet::deserialize(deserializer).map(|s| s.0)
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    /// Optional statement id; ignored for equivalence.
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Allow or Deny.
    #[serde(rename = "Effect")]
    pub effect: Effect,
    /// Who the statement applies to.
    #[serde(rename = "Principal")]
    pub principal: Principal,
    #[serde(
        rename = "Action",
        serialize_with = "serialize_set",
        deserialize_with = "deserialize_set"
    )]
    /// Actions granted or denied.
    pub actions: BTreeSet<String>,
    #[serde(
        rename = "Resource",
        serialize_with = "serialize_set",
        deserialize_with = "deserialize_set"
    )]
    /// Resource ARNs, possibly with a trailing glob.
    pub resources: BTreeSet<String>,
    #[serde(
        rename = "Condition",
        default,
        skip_serializing_if = "Conditions::is_empty"
    )]
    /// Conditions narrowing when the statement applies.
    pub conditions: Conditions,
}

impl PolicyStatement {
    /// An `Allow` statement for the wildcard principal.
    pub fn allow(
        actions: impl IntoIterator<Item = String>,
        resources: impl IntoIterator<Item = String>,
        conditions: Conditions,
    ) -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: Principal::Wildcard,
            actions: actions.into_iter().collect(),
            resources: resources.into_iter().collect(),
            conditions,
        }
    }

    /// The `s3:prefix` values under a `StringEquals` condition, if any.
    pub fn prefix_condition(&self) -> Option<&BTreeSet<String>> {
        self.conditions.get("StringEquals")?.get("s3:prefix")
    }

    /// Whether any resource in the statement matches `resource`, treating a
    /// trailing `*` in the statement resource as a glob.
    pub fn matches_resource(&self, resource: &str) -> bool {
        self.resources.iter().any(|r| resource_matches(r, resource))
    }
}

/// Glob match of a statement resource pattern against a concrete resource.
/// Only a trailing `*` is interpreted; other wildcards are literal.
pub fn resource_matches(pattern: &str, resource: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => resource.starts_with(prefix),
        None => pattern == resource,
    }
}

/// Bucket-level ARN: `arn:aws:s3:::bucket`.
pub fn bucket_arn(bucket: &str) -> String {
    format!("{ARN_PREFIX}{bucket}")
}

/// Object-level ARN glob for a prefix: `arn:aws:s3:::bucket/prefix*`.
pub fn object_arn(bucket: &str, prefix: &str) -> String {
    format!("{ARN_PREFIX}{bucket}/{prefix}*")
}

/// A bucket policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPolicyDocument {
    /// Policy language version.
    #[serde(rename = "Version")]
    pub version: String,
    /// The statements, evaluated as a set.
    #[serde(rename = "Statement", default)]
    pub statements: Vec<PolicyStatement>,
}

impl BucketPolicyDocument {
    /// An empty document at the supported version.
    pub fn empty() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements: Vec::new(),
        }
    }

    /// True when the document carries no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Default for BucketPolicyDocument {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_deserializes_scalar_and_array_forms() {
        let json = r#"{
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": ["arn:aws:s3:::mybucket/*"]
        }"#;
        let statement: PolicyStatement = serde_json::from_str(json).unwrap();
        assert_eq!(statement.effect, Effect::Allow);
        assert!(statement.principal.is_wildcard());
        assert!(statement.actions.contains("s3:GetObject"));
        assert!(statement.matches_resource("arn:aws:s3:::mybucket/photos/cat.png"));
    }

    #[test]
    fn test_principal_aws_wildcard_normalizes() {
        let json = r#"{
            "Effect": "Allow",
            "Principal": {"AWS": ["*"]},
            "Action": ["s3:ListBucket"],
            "Resource": "arn:aws:s3:::mybucket"
        }"#;
        let statement: PolicyStatement = serde_json::from_str(json).unwrap();
        assert_eq!(statement.principal, Principal::Wildcard);
    }

    #[test]
    fn test_conditions_round_trip() {
        let json = r#"{
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:ListBucket",
            "Resource": "arn:aws:s3:::mybucket",
            "Condition": {"StringEquals": {"s3:prefix": ["photos/"]}}
        }"#;
        let statement: PolicyStatement = serde_json::from_str(json).unwrap();
        assert_eq!(
            statement.prefix_condition().unwrap(),
            &BTreeSet::from(["photos/".to_string()])
        );

        let back = serde_json::to_string(&statement).unwrap();
        let again: PolicyStatement = serde_json::from_str(&back).unwrap();
        assert_eq!(statement, again);
    }

    #[test]
    fn test_resource_glob_is_trailing_only() {
        assert!(resource_matches("arn:aws:s3:::b/*", "arn:aws:s3:::b/x/y"));
        assert!(resource_matches("arn:aws:s3:::b", "arn:aws:s3:::b"));
        assert!(!resource_matches("arn:aws:s3:::b", "arn:aws:s3:::b/x"));
        assert!(!resource_matches("arn:aws:s3:::*/b", "arn:aws:s3:::a/b"));
    }

    #[test]
    fn test_empty_document_serializes_without_statements_content() {
        let doc = BucketPolicyDocument::empty();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("2012-10-17"));
        let back: BucketPolicyDocument = serde_json::from_str(&json).unwrap();
        assert!(back.is_empty());
    }
}
