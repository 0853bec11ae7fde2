//! Multipart upload planning and resumption.
//!
//! Everything here is bookkeeping: deciding how an object is cut into parts,
//! tracking which parts a session has confirmed, and reconciling a local plan
//! against what the remote end reports after an interruption. No bytes are
//! moved and no network calls are made.

mod planner;

pub use planner::{choose_plan, resume, verify_complete, PartSlice, ResumeOutcome, UploadPlan};

use crate::error::MultipartError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};

/// Smallest part size the protocol accepts for all parts but the last (5 MiB).
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest size of a single part (5 GiB).
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts in one upload.
pub const MAX_PARTS: u64 = 10_000;

/// Largest object a multipart upload can produce (5 TiB).
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 * 1024;

/// Hex MD5 of a part's bytes, as servers report it in the part's ETag.
pub fn part_etag(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Base64 MD5 of a body, for the `content-md5` header.
pub fn content_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    BASE64.encode(hasher.finalize())
}

/// A part the remote end has confirmed, as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    /// 1-based part number.
    pub part_number: u32,
    /// ETag the server returned for the part.
    pub etag: String,
    /// Size of the part in bytes.
    pub size: u64,
}

/// Lifecycle of a multipart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created locally, no upload id yet.
    NotStarted,
    /// Upload id assigned, parts may be in flight.
    InProgress,
    /// All parts confirmed and the completion accepted.
    Completed,
    /// Abandoned; the upload id is no longer usable.
    Aborted,
}

impl SessionState {
    fn label(self) -> &'static str {
        match self {
            SessionState::NotStarted => "not-started",
            SessionState::InProgress => "in-progress",
            SessionState::Completed => "completed",
            SessionState::Aborted => "aborted",
        }
    }
}

/// Local record of one multipart upload.
///
/// The session enforces the state machine `NotStarted -> InProgress ->
/// {Completed, Aborted}`; any other transition is an
/// [`MultipartError::InvalidTransition`].
#[derive(Debug, Clone)]
pub struct MultipartSession {
    bucket: String,
    key: String,
    upload_id: Option<String>,
    state: SessionState,
    confirmed: Vec<UploadPart>,
}

impl MultipartSession {
    /// Create a session that has not yet been started on the remote end.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id: None,
            state: SessionState::NotStarted,
            confirmed: Vec::new(),
        }
    }

    /// Bucket the upload targets.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key the upload targets.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upload id, present once the session is started.
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Parts confirmed so far, ordered by part number.
    pub fn confirmed_parts(&self) -> &[UploadPart] {
        &self.confirmed
    }

    /// Record the upload id the server assigned and move to `InProgress`.
    pub fn start(&mut self, upload_id: impl Into<String>) -> Result<(), MultipartError> {
        if self.state != SessionState::NotStarted {
            return Err(self.bad_transition("start"));
        }
        self.upload_id = Some(upload_id.into());
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// Record a part the server confirmed.
    ///
    /// Re-confirming a part number replaces the earlier record, matching the
    /// server's last-write-wins behavior for re-uploaded parts.
    pub fn confirm_part(&mut self, part: UploadPart) -> Result<(), MultipartError> {
        if self.state != SessionState::InProgress {
            return Err(self.bad_transition("confirm_part"));
        }
        if part.part_number == 0 || u64::from(part.part_number) > MAX_PARTS {
            return Err(MultipartError::InvalidPartNumber {
                part_number: part.part_number,
                max: MAX_PARTS,
            });
        }
        match self
            .confirmed
            .binary_search_by_key(&part.part_number, |p| p.part_number)
        {
            Ok(i) => self.confirmed[i] = part,
            Err(i) => self.confirmed.insert(i, part),
        }
        Ok(())
    }

    /// Mark the session complete after verifying the plan is fully covered.
    pub fn complete(&mut self, plan: &UploadPlan) -> Result<(), MultipartError> {
        if self.state != SessionState::InProgress {
            return Err(self.bad_transition("complete"));
        }
        verify_complete(plan, &self.confirmed)?;
        self.state = SessionState::Completed;
        Ok(())
    }

    /// Abandon the session.
    pub fn abort(&mut self) -> Result<(), MultipartError> {
        if self.state != SessionState::InProgress {
            return Err(self.bad_transition("abort"));
        }
        self.state = SessionState::Aborted;
        Ok(())
    }

    fn bad_transition(&self, attempted: &str) -> MultipartError {
        MultipartError::InvalidTransition {
            state: self.state.label().to_string(),
            attempted: attempted.to_string(),
        }
    }
}
