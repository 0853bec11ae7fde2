//! Multipart planning and resumption scenarios, end to end through the
//! public API.

use s3_compat::{
    choose_plan, resume, MultipartError, MultipartSession, SessionState, UploadPart, UploadPlan,
};

const THRESHOLD: u64 = 5_242_880;
const MIN_PART: u64 = 5 * 1024 * 1024;

fn hashes_for(plan: &UploadPlan) -> Vec<String> {
    plan.parts()
        .iter()
        .map(|p| format!("etag-{}", p.part_number))
        .collect()
}

fn remote_from(plan: &UploadPlan, numbers: &[u32]) -> Vec<UploadPart> {
    numbers
        .iter()
        .map(|&n| UploadPart {
            part_number: n,
            etag: format!("etag-{n}"),
            size: plan.parts()[(n - 1) as usize].size,
        })
        .collect()
}

#[test]
fn small_object_is_a_single_put() {
    let plan = choose_plan(4_999_999, THRESHOLD).unwrap();
    assert_eq!(plan, UploadPlan::SinglePut { size: 4_999_999 });
    assert!(plan.parts().is_empty());
}

#[test]
fn large_object_plan_respects_part_floor_and_coverage() {
    let plan = choose_plan(10_000_000, THRESHOLD).unwrap();
    let parts = plan.parts();

    assert_eq!(parts.len(), 2);
    assert!(parts[0].size >= MIN_PART);
    assert_eq!(parts[0].size + parts[1].size, 10_000_000);
    assert_eq!(parts[1].offset, parts[0].size);
}

#[test]
fn interrupted_upload_resumes_only_missing_parts() {
    let plan = choose_plan(MIN_PART * 4, MIN_PART).unwrap();
    let local = hashes_for(&plan);

    // Server saw parts 1 and 2 before the interruption.
    let remote = remote_from(&plan, &[1, 2]);
    let outcome = resume(&plan, &remote, &local).unwrap();

    assert_eq!(outcome.reusable, vec![1, 2]);
    let re_upload: Vec<u32> = outcome.to_upload.iter().map(|p| p.part_number).collect();
    assert_eq!(re_upload, vec![3, 4]);
}

#[test]
fn mismatched_part_invalidates_everything_after_it() {
    let plan = choose_plan(MIN_PART * 3, MIN_PART).unwrap();
    let local = hashes_for(&plan);

    let mut remote = remote_from(&plan, &[1, 2, 3]);
    remote[1].etag = "different-content".to_string();
    let outcome = resume(&plan, &remote, &local).unwrap();

    // Part 3 matched but sits after the mismatch; it must be re-uploaded.
    assert_eq!(outcome.reusable, vec![1]);
    let re_upload: Vec<u32> = outcome.to_upload.iter().map(|p| p.part_number).collect();
    assert_eq!(re_upload, vec![2, 3]);
}

#[test]
fn size_contradiction_aborts_the_resume() {
    let plan = choose_plan(MIN_PART * 2, MIN_PART).unwrap();
    let local = hashes_for(&plan);

    let mut remote = remote_from(&plan, &[1]);
    remote[0].size = plan.parts()[0].size + 7;

    let err = resume(&plan, &remote, &local).unwrap_err();
    assert!(matches!(err, MultipartError::ResumeIntegrity { .. }));
}

#[test]
fn session_drives_a_full_upload_lifecycle() {
    let plan = choose_plan(MIN_PART * 3, MIN_PART).unwrap();
    let mut session = MultipartSession::new("bucket", "videos/clip.mp4");

    session.start("server-upload-id").unwrap();
    assert_eq!(session.state(), SessionState::InProgress);

    // Parts complete out of order; only the final set has to be contiguous.
    for n in [2u32, 3, 1] {
        let slice = plan.parts()[(n - 1) as usize];
        session
            .confirm_part(UploadPart {
                part_number: n,
                etag: format!("etag-{n}"),
                size: slice.size,
            })
            .unwrap();
    }

    session.complete(&plan).unwrap();
    assert_eq!(session.state(), SessionState::Completed);
}

#[test]
fn completing_with_a_gap_names_the_missing_part() {
    let plan = choose_plan(MIN_PART * 3, MIN_PART).unwrap();
    let mut session = MultipartSession::new("bucket", "key");
    session.start("id").unwrap();

    for n in [1u32, 3] {
        let slice = plan.parts()[(n - 1) as usize];
        session
            .confirm_part(UploadPart {
                part_number: n,
                etag: format!("etag-{n}"),
                size: slice.size,
            })
            .unwrap();
    }

    let err = session.complete(&plan).unwrap_err();
    assert!(matches!(
        err,
        MultipartError::IncompleteUpload { missing_part: 2 }
    ));
    // The session stays in progress; the caller can upload part 2 and retry.
    assert_eq!(session.state(), SessionState::InProgress);
}

#[test]
fn aborted_session_is_terminal() {
    let plan = choose_plan(MIN_PART * 2, MIN_PART).unwrap();
    let mut session = MultipartSession::new("bucket", "key");
    session.start("id").unwrap();
    session.abort().unwrap();

    assert_eq!(session.state(), SessionState::Aborted);
    let err = session.complete(&plan).unwrap_err();
    assert!(matches!(err, MultipartError::InvalidTransition { .. }));
}
