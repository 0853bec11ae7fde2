//! Pure planning logic: part sizing, completion checks, and resume
//! reconciliation.

use super::{UploadPart, MAX_OBJECT_SIZE, MAX_PARTS, MAX_PART_SIZE, MIN_PART_SIZE};
use crate::error::MultipartError;
use tracing::debug;

/// One planned part: the byte range it covers in the source object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSlice {
    /// 1-based part number.
    pub part_number: u32,
    /// Byte offset of the part in the source.
    pub offset: u64,
    /// Length of the part in bytes.
    pub size: u64,
}

/// How an object should be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Object fits in a single PUT.
    SinglePut {
        /// Total object size.
        size: u64,
    },
    /// Object is split into parts, uploadable in any order.
    Multipart {
        /// Total object size.
        total_size: u64,
        /// The part slices, ordered by part number, covering the object
        /// exactly with the last part absorbing the remainder.
        parts: Vec<PartSlice>,
    },
}

impl UploadPlan {
    /// The planned part slices; empty for a single PUT.
    pub fn parts(&self) -> &[PartSlice] {
        match self {
            UploadPlan::SinglePut { .. } => &[],
            UploadPlan::Multipart { parts, .. } => parts,
        }
    }

    /// Total size of the object the plan covers.
    pub fn total_size(&self) -> u64 {
        match self {
            UploadPlan::SinglePut { size } => *size,
            UploadPlan::Multipart { total_size, .. } => *total_size,
        }
    }
}

/// Decide how to upload an object of `total_size` bytes.
///
/// Sizes at or below `threshold` use a single PUT. Larger objects are split
/// so that every part except the last meets the protocol's 5 MiB floor, the
/// part count stays within 10,000, and the last part absorbs the remainder.
pub fn choose_plan(total_size: u64, threshold: u64) -> Result<UploadPlan, MultipartError> {
    if total_size > MAX_OBJECT_SIZE {
        return Err(MultipartError::ObjectTooLarge {
            size: total_size,
            max_size: MAX_OBJECT_SIZE,
        });
    }
    if total_size <= threshold {
        return Ok(UploadPlan::SinglePut { size: total_size });
    }

    // Target the threshold as part size, then grow it until the count fits.
    let mut part_size = threshold.max(MIN_PART_SIZE);
    let count = total_size.div_ceil(part_size);
    if count > MAX_PARTS {
        part_size = total_size.div_ceil(MAX_PARTS);
    }
    let part_size = part_size.min(MAX_PART_SIZE);

    let mut parts = Vec::new();
    let mut offset = 0u64;
    let mut part_number = 1u32;
    while offset < total_size {
        let remaining = total_size - offset;
        // Fold a short tail into the previous part only if a standalone last
        // part would violate nothing; the last part may be any size, so a
        // plain split is always valid.
        let size = remaining.min(part_size);
        parts.push(PartSlice {
            part_number,
            offset,
            size,
        });
        offset += size;
        part_number += 1;
    }

    debug!(
        total_size,
        part_count = parts.len(),
        part_size,
        "planned multipart upload"
    );
    Ok(UploadPlan::Multipart { total_size, parts })
}

/// Result of reconciling a plan against a previously interrupted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeOutcome {
    /// Part numbers whose server-side copy matches the local data and can be
    /// skipped.
    pub reusable: Vec<u32>,
    /// Slices that must be uploaded (again).
    pub to_upload: Vec<PartSlice>,
}

/// Reconcile `plan` against the parts a server lists for an interrupted
/// upload, comparing the server's ETag for each part to the locally
/// recomputed hash in `local_hashes` (indexed by part number order).
///
/// Reuse is prefix-only: the first part whose hash mismatches, or a gap in
/// the server's part numbers, truncates reuse there, and every later part is
/// re-uploaded even if its hash happens to match. A remote part whose size
/// contradicts the planned slice is a [`MultipartError::ResumeIntegrity`]
/// error: the caller must abort the old session and start fresh.
pub fn resume(
    plan: &UploadPlan,
    remote_parts: &[UploadPart],
    local_hashes: &[String],
) -> Result<ResumeOutcome, MultipartError> {
    let slices = plan.parts();

    let mut reusable = Vec::new();
    let mut truncated = false;
    let mut expected_next = 1u32;

    for remote in remote_parts {
        // Server-listed data; a zero part number is outside the protocol and
        // must surface as an error, not an index underflow.
        if remote.part_number == 0 {
            return Err(MultipartError::InvalidPartNumber {
                part_number: 0,
                max: MAX_PARTS,
            });
        }
        let idx = (remote.part_number - 1) as usize;
        let slice = match slices.get(idx) {
            Some(s) => *s,
            None => {
                // A remote part beyond the plan means the sizes disagree.
                return Err(MultipartError::ResumeIntegrity {
                    part_number: remote.part_number,
                    planned_size: 0,
                    recorded_size: remote.size,
                });
            }
        };
        if remote.size != slice.size {
            return Err(MultipartError::ResumeIntegrity {
                part_number: remote.part_number,
                planned_size: slice.size,
                recorded_size: remote.size,
            });
        }

        if truncated {
            continue;
        }
        if remote.part_number != expected_next {
            // Gap in the confirmed sequence.
            truncated = true;
            continue;
        }
        let matches = local_hashes
            .get(idx)
            .is_some_and(|h| h.eq_ignore_ascii_case(&remote.etag));
        if matches {
            reusable.push(remote.part_number);
            expected_next += 1;
        } else {
            truncated = true;
        }
    }

    let to_upload = slices
        .iter()
        .filter(|s| !reusable.contains(&s.part_number))
        .copied()
        .collect();

    debug!(
        reusable = reusable.len(),
        total = slices.len(),
        "reconciled interrupted upload"
    );
    Ok(ResumeOutcome {
        reusable,
        to_upload,
    })
}

/// Check that `parts` covers every planned part number 1..=N with no gaps.
pub fn verify_complete(plan: &UploadPlan, parts: &[UploadPart]) -> Result<(), MultipartError> {
    let mut numbers: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
    numbers.sort_unstable();
    numbers.dedup();

    for (i, slice) in plan.parts().iter().enumerate() {
        match numbers.get(i) {
            Some(n) if *n == slice.part_number => {}
            _ => {
                return Err(MultipartError::IncompleteUpload {
                    missing_part: slice.part_number,
                })
            }
        }
    }
    Ok(())
}
