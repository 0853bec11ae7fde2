//! Classification and rewriting of anonymous-access bucket policies.
//!
//! Both entry points are pure: they read the input document and return a
//! fresh value, leaving the argument untouched.

use super::document::{
    bucket_arn, object_arn, resource_matches, BucketPolicyDocument, Conditions, Effect,
    PolicyStatement, POLICY_VERSION,
};
use super::BucketAccess;
use crate::error::PolicyError;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Bucket-level action every access grant carries.
pub const COMMON_BUCKET_ACTIONS: &[&str] = &["s3:GetBucketLocation"];

/// Bucket-level action granting listing.
pub const READ_BUCKET_ACTIONS: &[&str] = &["s3:ListBucket"];

/// Bucket-level action granting multipart listing.
pub const WRITE_BUCKET_ACTIONS: &[&str] = &["s3:ListBucketMultipartUploads"];

/// Object-level read actions.
pub const READ_OBJECT_ACTIONS: &[&str] = &["s3:GetObject"];

/// Object-level write actions.
pub const WRITE_OBJECT_ACTIONS: &[&str] = &[
    "s3:AbortMultipartUpload",
    "s3:DeleteObject",
    "s3:ListMultipartUploadParts",
    "s3:PutObject",
];

fn action_set(actions: &[&str]) -> BTreeSet<String> {
    actions.iter().map(|a| a.to_string()).collect()
}

/// Classify the anonymous access a document grants to (bucket, prefix).
///
/// Only `Allow` statements with the wildcard principal participate. A `Deny`
/// statement touching the bucket is outside the modeled algebra and surfaces
/// as a recoverable [`PolicyError::DenyNotModeled`].
pub fn classify(
    document: &BucketPolicyDocument,
    bucket: &str,
    prefix: &str,
) -> Result<BucketAccess, PolicyError> {
    check_document(document, bucket)?;

    let bucket_resource = bucket_arn(bucket);
    let object_resource = object_arn(bucket, prefix);

    let mut common = false;
    let mut read_bucket = false;
    let mut write_bucket = false;

    // Object-level flags are resolved by longest matching resource pattern;
    // equally long matches unite their flags.
    let mut best_match_len = 0usize;
    let mut read_object = false;
    let mut write_object = false;

    for statement in &document.statements {
        if statement.effect != Effect::Allow || !statement.principal.is_wildcard() {
            continue;
        }

        if statement.matches_resource(&bucket_resource) {
            if COMMON_BUCKET_ACTIONS
                .iter()
                .all(|a| statement.actions.contains(*a))
            {
                common = true;
            }
            if statement.actions.contains("s3:ListBucket")
                && prefix_condition_allows(statement, prefix)
            {
                read_bucket = true;
            }
            if statement.actions.contains("s3:ListBucketMultipartUploads") {
                write_bucket = true;
            }
        }

        for pattern in &statement.resources {
            if !resource_matches(pattern, &object_resource) {
                continue;
            }
            let len = pattern.len();
            if len > best_match_len {
                best_match_len = len;
                read_object = false;
                write_object = false;
            }
            if len == best_match_len {
                if READ_OBJECT_ACTIONS
                    .iter()
                    .all(|a| statement.actions.contains(*a))
                {
                    read_object = true;
                }
                if WRITE_OBJECT_ACTIONS
                    .iter()
                    .all(|a| statement.actions.contains(*a))
                {
                    write_object = true;
                }
            }
        }
    }

    let read = common && read_bucket && read_object;
    let write = common && write_bucket && write_object;
    let access = match (read, write) {
        (true, true) => BucketAccess::ReadWrite,
        (true, false) => BucketAccess::ReadOnly,
        (false, true) => BucketAccess::WriteOnly,
        (false, false) => BucketAccess::None,
    };
    debug!(bucket, prefix, ?access, "classified bucket policy");
    Ok(access)
}

/// Rewrite `document` so that (bucket, prefix) grants exactly `target`,
/// leaving grants for other prefixes and buckets intact.
///
/// The rewrite runs in two phases: first every statement attributable solely
/// to (bucket, prefix) is removed, with shared statements trimmed rather than
/// deleted; then the statements `target` requires are synthesized and merged
/// into survivors that already agree on everything but resources or actions.
pub fn set_policy(
    document: &BucketPolicyDocument,
    bucket: &str,
    prefix: &str,
    target: BucketAccess,
) -> Result<BucketPolicyDocument, PolicyError> {
    check_document(document, bucket)?;
    debug!(bucket, prefix, ?target, "rewriting bucket policy");

    let mut statements = remove_grants(&document.statements, bucket, prefix);

    for new_statement in target_statements(bucket, prefix, target) {
        merge_statement(&mut statements, new_statement);
    }
    cleanup_bucket_actions(&mut statements, bucket);

    Ok(BucketPolicyDocument {
        version: POLICY_VERSION.to_string(),
        statements,
    })
}

fn check_document(document: &BucketPolicyDocument, bucket: &str) -> Result<(), PolicyError> {
    if !document.statements.is_empty() && document.version != POLICY_VERSION {
        return Err(PolicyError::UnsupportedVersion {
            version: document.version.clone(),
        });
    }
    let bucket_root = bucket_arn(bucket);
    for statement in &document.statements {
        let touches_bucket = statement
            .resources
            .iter()
            .any(|r| r == &bucket_root || r.starts_with(&format!("{bucket_root}/")));
        if statement.effect == Effect::Deny && touches_bucket {
            return Err(PolicyError::DenyNotModeled {
                bucket: bucket.to_string(),
            });
        }
    }
    Ok(())
}

/// True when a `ListBucket` statement's conditions permit listing `prefix`.
/// No condition means every prefix; otherwise the `StringEquals s3:prefix`
/// values must contain the prefix exactly.
fn prefix_condition_allows(statement: &PolicyStatement, prefix: &str) -> bool {
    match statement.prefix_condition() {
        None => statement.conditions.is_empty(),
        Some(values) => !prefix.is_empty() && values.contains(prefix),
    }
}

/// Phase one: strip every grant attributable solely to (bucket, prefix).
fn remove_grants(
    statements: &[PolicyStatement],
    bucket: &str,
    prefix: &str,
) -> Vec<PolicyStatement> {
    let bucket_resource = bucket_arn(bucket);
    let object_resource = object_arn(bucket, prefix);

    let mut out = Vec::new();
    for statement in statements {
        if statement.effect != Effect::Allow || !statement.principal.is_wildcard() {
            out.push(statement.clone());
            continue;
        }

        let mut statement = statement.clone();

        // Object grants for this exact prefix live on a dedicated resource.
        statement.resources.remove(&object_resource);

        // Listing edits below touch actions and conditions; a merged
        // statement also covering other buckets must be split first so those
        // grants survive untouched.
        if statement.resources.contains(&bucket_resource)
            && statement.actions.contains("s3:ListBucket")
            && statement.resources.len() > 1
        {
            let mut rest = statement.clone();
            rest.resources.remove(&bucket_resource);
            out.push(rest);
            statement.resources = BTreeSet::from([bucket_resource.clone()]);
        }

        if statement.resources.contains(&bucket_resource)
            && statement.actions.contains("s3:ListBucket")
        {
            let had_condition = statement.prefix_condition().is_some();
            if had_condition {
                // Fold this prefix out of the shared condition.
                if let Some(op) = statement.conditions.get_mut("StringEquals") {
                    if let Some(values) = op.get_mut("s3:prefix") {
                        values.remove(prefix);
                        if values.is_empty() {
                            op.remove("s3:prefix");
                        }
                    }
                    if op.is_empty() {
                        statement.conditions.remove("StringEquals");
                    }
                }
                // The listing grant existed only for conditioned prefixes.
                if statement.conditions.is_empty() {
                    statement.actions.remove("s3:ListBucket");
                }
            } else if prefix.is_empty() && statement.conditions.is_empty() {
                // An unconditioned listing grant belongs to the empty prefix.
                statement.actions.remove("s3:ListBucket");
            }
        }

        if !statement.actions.is_empty() && !statement.resources.is_empty() {
            out.push(statement);
        }
    }
    out
}

/// Statements a target access level requires for (bucket, prefix).
fn target_statements(bucket: &str, prefix: &str, target: BucketAccess) -> Vec<PolicyStatement> {
    if target == BucketAccess::None {
        return Vec::new();
    }

    let bucket_resource = bucket_arn(bucket);
    let object_resource = object_arn(bucket, prefix);
    let read = matches!(target, BucketAccess::ReadOnly | BucketAccess::ReadWrite);
    let write = matches!(target, BucketAccess::WriteOnly | BucketAccess::ReadWrite);

    let mut statements = vec![PolicyStatement::allow(
        action_set(COMMON_BUCKET_ACTIONS),
        [bucket_resource.clone()],
        Conditions::new(),
    )];

    if read {
        let conditions = if prefix.is_empty() {
            Conditions::new()
        } else {
            let mut keys = BTreeMap::new();
            keys.insert(
                "s3:prefix".to_string(),
                BTreeSet::from([prefix.to_string()]),
            );
            let mut conditions = Conditions::new();
            conditions.insert("StringEquals".to_string(), keys);
            conditions
        };
        statements.push(PolicyStatement::allow(
            action_set(READ_BUCKET_ACTIONS),
            [bucket_resource.clone()],
            conditions,
        ));
        statements.push(PolicyStatement::allow(
            action_set(READ_OBJECT_ACTIONS),
            [object_resource.clone()],
            Conditions::new(),
        ));
    }
    if write {
        statements.push(PolicyStatement::allow(
            action_set(WRITE_BUCKET_ACTIONS),
            [bucket_resource],
            Conditions::new(),
        ));
        statements.push(PolicyStatement::allow(
            action_set(WRITE_OBJECT_ACTIONS),
            [object_resource],
            Conditions::new(),
        ));
    }
    statements
}

/// Phase two: merge a synthesized statement into the survivors.
///
/// A statement agreeing on {actions, effect, principal, conditions} absorbs
/// the new resources; one agreeing on {resources, effect, principal,
/// conditions} absorbs the new actions; otherwise the statement is appended.
fn merge_statement(statements: &mut Vec<PolicyStatement>, new: PolicyStatement) {
    for existing in statements.iter_mut() {
        if existing.effect != new.effect || existing.principal != new.principal {
            continue;
        }
        if existing.conditions == new.conditions {
            if existing.actions == new.actions {
                existing.resources.extend(new.resources);
                return;
            }
            if existing.resources == new.resources {
                existing.actions.extend(new.actions);
                return;
            }
        } else if existing.actions == new.actions
            && existing.resources == new.resources
            && !existing.conditions.is_empty()
            && !new.conditions.is_empty()
        {
            // Same grant, different conditioned prefixes: union the condition
            // values. An unconditioned statement never merges this way, since
            // adding a condition to it would narrow what it allows.
            for (op, keys) in new.conditions {
                let slot = existing.conditions.entry(op).or_default();
                for (key, values) in keys {
                    slot.entry(key).or_default().extend(values);
                }
            }
            return;
        }
    }
    statements.push(new);
}

/// Drop bucket-wide helper actions once nothing references them anymore.
///
/// `s3:GetBucketLocation` and `s3:ListBucketMultipartUploads` are shared
/// across every prefix grant on a bucket; when the last grant of the kind
/// that needs them disappears, they must go too, or a bucket with no policy
/// would keep a vestigial statement forever.
fn cleanup_bucket_actions(statements: &mut Vec<PolicyStatement>, bucket: &str) {
    let bucket_resource = bucket_arn(bucket);
    let object_root = format!("{bucket_resource}/");

    let any_object_grant = statements.iter().any(|s| {
        s.effect == Effect::Allow
            && s.principal.is_wildcard()
            && s.resources.iter().any(|r| r.starts_with(&object_root))
    });
    let any_listing = statements.iter().any(|s| {
        s.effect == Effect::Allow
            && s.principal.is_wildcard()
            && s.resources.contains(&bucket_resource)
            && s.actions.contains("s3:ListBucket")
    });
    let any_write_grant = statements.iter().any(|s| {
        s.effect == Effect::Allow
            && s.principal.is_wildcard()
            && s.resources.iter().any(|r| r.starts_with(&object_root))
            && WRITE_OBJECT_ACTIONS.iter().all(|a| s.actions.contains(*a))
    });

    let mut split_off = Vec::new();
    for statement in statements.iter_mut() {
        if statement.effect != Effect::Allow
            || !statement.principal.is_wildcard()
            || !statement.resources.contains(&bucket_resource)
        {
            continue;
        }
        let mut to_remove: Vec<&str> = Vec::new();
        if !any_object_grant && !any_listing {
            to_remove.push("s3:GetBucketLocation");
        }
        if !any_write_grant {
            to_remove.push("s3:ListBucketMultipartUploads");
        }
        if to_remove.is_empty() {
            continue;
        }
        // A merged statement also covering other buckets keeps its grant for
        // them; only this bucket's slice loses the actions.
        if statement.resources.len() > 1 {
            let mut rest = statement.clone();
            rest.resources.remove(&bucket_resource);
            split_off.push(rest);
            statement.resources = BTreeSet::from([bucket_resource.clone()]);
        }
        for action in to_remove {
            statement.actions.remove(action);
        }
    }
    statements.extend(split_off);
    statements.retain(|s| !s.actions.is_empty() && !s.resources.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_ok(doc: &BucketPolicyDocument, bucket: &str, prefix: &str) -> BucketAccess {
        classify(doc, bucket, prefix).unwrap()
    }

    #[test]
    fn test_empty_document_classifies_none() {
        let doc = BucketPolicyDocument::empty();
        assert_eq!(classify_ok(&doc, "mybucket", ""), BucketAccess::None);
    }

    #[test]
    fn test_set_then_classify_round_trip() {
        let doc = BucketPolicyDocument::empty();
        for target in [
            BucketAccess::ReadOnly,
            BucketAccess::WriteOnly,
            BucketAccess::ReadWrite,
        ] {
            let updated = set_policy(&doc, "mybucket", "photos/", target).unwrap();
            assert_eq!(classify_ok(&updated, "mybucket", "photos/"), target);
        }
    }

    #[test]
    fn test_set_policy_is_pure() {
        let doc = BucketPolicyDocument::empty();
        let _ = set_policy(&doc, "mybucket", "", BucketAccess::ReadWrite).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_none_on_last_prefix_leaves_zero_statements() {
        let doc = BucketPolicyDocument::empty();
        let granted = set_policy(&doc, "mybucket", "photos/", BucketAccess::ReadWrite).unwrap();
        assert!(!granted.is_empty());

        let cleared = set_policy(&granted, "mybucket", "photos/", BucketAccess::None).unwrap();
        assert!(cleared.is_empty(), "got {:?}", cleared.statements);
    }

    #[test]
    fn test_second_prefix_does_not_disturb_first() {
        let doc = BucketPolicyDocument::empty();
        let one = set_policy(&doc, "mybucket", "a/", BucketAccess::ReadOnly).unwrap();
        let two = set_policy(&one, "mybucket", "b/", BucketAccess::ReadWrite).unwrap();

        assert_eq!(classify_ok(&two, "mybucket", "a/"), BucketAccess::ReadOnly);
        assert_eq!(classify_ok(&two, "mybucket", "b/"), BucketAccess::ReadWrite);
    }

    #[test]
    fn test_clearing_one_prefix_keeps_the_other() {
        let doc = BucketPolicyDocument::empty();
        let one = set_policy(&doc, "mybucket", "a/", BucketAccess::ReadOnly).unwrap();
        let two = set_policy(&one, "mybucket", "b/", BucketAccess::ReadOnly).unwrap();
        let cleared = set_policy(&two, "mybucket", "a/", BucketAccess::None).unwrap();

        assert_eq!(
            classify_ok(&cleared, "mybucket", "a/"),
            BucketAccess::None
        );
        assert_eq!(
            classify_ok(&cleared, "mybucket", "b/"),
            BucketAccess::ReadOnly
        );
    }

    #[test]
    fn test_repeated_set_does_not_duplicate_statements() {
        let doc = BucketPolicyDocument::empty();
        let once = set_policy(&doc, "mybucket", "p/", BucketAccess::ReadWrite).unwrap();
        let twice = set_policy(&once, "mybucket", "p/", BucketAccess::ReadWrite).unwrap();
        assert_eq!(once.statements.len(), twice.statements.len());
    }

    #[test]
    fn test_shared_listing_statement_folds_prefix_condition() {
        let doc = BucketPolicyDocument::empty();
        let one = set_policy(&doc, "mybucket", "a/", BucketAccess::ReadOnly).unwrap();
        let two = set_policy(&one, "mybucket", "b/", BucketAccess::ReadOnly).unwrap();

        // Both prefixes share one ListBucket statement with two condition
        // values; clearing one folds its value out instead of deleting the
        // statement.
        let cleared = set_policy(&two, "mybucket", "a/", BucketAccess::None).unwrap();
        let listing = cleared
            .statements
            .iter()
            .find(|s| s.actions.contains("s3:ListBucket"))
            .unwrap();
        let values = listing.prefix_condition().unwrap();
        assert!(!values.contains("a/"));
        assert!(values.contains("b/"));
    }

    #[test]
    fn test_downgrade_readwrite_to_readonly_drops_write_grants() {
        let doc = BucketPolicyDocument::empty();
        let rw = set_policy(&doc, "mybucket", "p/", BucketAccess::ReadWrite).unwrap();
        let ro = set_policy(&rw, "mybucket", "p/", BucketAccess::ReadOnly).unwrap();

        assert_eq!(classify_ok(&ro, "mybucket", "p/"), BucketAccess::ReadOnly);
        assert!(!ro
            .statements
            .iter()
            .any(|s| s.actions.contains("s3:PutObject")));
        assert!(!ro
            .statements
            .iter()
            .any(|s| s.actions.contains("s3:ListBucketMultipartUploads")));
    }

    #[test]
    fn test_empty_prefix_read_has_no_condition() {
        let doc = BucketPolicyDocument::empty();
        let updated = set_policy(&doc, "mybucket", "", BucketAccess::ReadOnly).unwrap();
        let listing = updated
            .statements
            .iter()
            .find(|s| s.actions.contains("s3:ListBucket"))
            .unwrap();
        assert!(listing.conditions.is_empty());
        assert_eq!(classify_ok(&updated, "mybucket", ""), BucketAccess::ReadOnly);
    }

    #[test]
    fn test_deny_statement_is_a_recoverable_error() {
        let mut doc = BucketPolicyDocument::empty();
        doc.statements.push(PolicyStatement {
            sid: None,
            effect: Effect::Deny,
            principal: super::super::document::Principal::Wildcard,
            actions: BTreeSet::from(["s3:GetObject".to_string()]),
            resources: BTreeSet::from(["arn:aws:s3:::mybucket/secret*".to_string()]),
            conditions: Conditions::new(),
        });

        let err = classify(&doc, "mybucket", "").unwrap_err();
        assert!(matches!(err, PolicyError::DenyNotModeled { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let doc = set_policy(
            &BucketPolicyDocument::empty(),
            "mybucket",
            "",
            BucketAccess::ReadOnly,
        )
        .unwrap();
        let mut doc = doc;
        doc.version = "2008-10-17".to_string();

        let err = classify(&doc, "mybucket", "").unwrap_err();
        assert!(matches!(err, PolicyError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_foreign_bucket_statements_are_untouched() {
        let doc = BucketPolicyDocument::empty();
        let other = set_policy(&doc, "other", "x/", BucketAccess::ReadOnly).unwrap();
        let combined = set_policy(&other, "mybucket", "", BucketAccess::ReadWrite).unwrap();
        let cleared = set_policy(&combined, "mybucket", "", BucketAccess::None).unwrap();

        assert_eq!(classify_ok(&cleared, "other", "x/"), BucketAccess::ReadOnly);
        assert_eq!(classify_ok(&cleared, "mybucket", ""), BucketAccess::None);
    }

    #[test]
    fn test_longest_resource_match_wins() {
        // A read-write grant on the whole bucket, narrowed by a read-only
        // statement on a deeper prefix: the deeper prefix classifies by the
        // longest matching resource.
        let doc = BucketPolicyDocument::empty();
        let mut broad = set_policy(&doc, "mybucket", "", BucketAccess::ReadWrite).unwrap();
        broad.statements.push(PolicyStatement::allow(
            ["s3:GetObject".to_string()],
            ["arn:aws:s3:::mybucket/docs/*".to_string()],
            Conditions::new(),
        ));

        assert_eq!(
            classify_ok(&broad, "mybucket", "docs/"),
            BucketAccess::ReadOnly
        );
        assert_eq!(
            classify_ok(&broad, "mybucket", "other/"),
            BucketAccess::ReadWrite
        );
    }
}
