#![forbid(unsafe_code)]

use onduty_contracts::{
    ApprovalRequest, DaySession, PeriodMarker, RequestId, RequestStatus, ReviewDecision,
    ReviewRole, ReviewVerdict, Subject, SubjectId, UnixTimeMs,
};
use onduty_storage::{DutyStore, StorageError};

fn subject_id(id: &str) -> SubjectId {
    SubjectId::new(id).unwrap()
}

fn period(marker: &str) -> PeriodMarker {
    PeriodMarker::new(marker).unwrap()
}

fn request_id(id: &str) -> RequestId {
    RequestId::new(id).unwrap()
}

fn request(id: &str, start_ms: u64) -> ApprovalRequest {
    ApprovalRequest::v1(
        request_id(id),
        subject_id("stu_001"),
        period("sem4"),
        UnixTimeMs(start_ms),
        DaySession::Am,
        UnixTimeMs(start_ms + 86_400_000),
        DaySession::Pm,
        "district robotics meet".to_string(),
        Vec::new(),
        UnixTimeMs(start_ms - 10_000),
    )
    .unwrap()
}

fn approve(role: ReviewRole, t: u64) -> ReviewDecision {
    ReviewDecision::v1(role, ReviewVerdict::Approved, None, UnixTimeMs(t)).unwrap()
}

fn reject(role: ReviewRole, remark: &str, t: u64) -> ReviewDecision {
    ReviewDecision::v1(
        role,
        ReviewVerdict::Rejected,
        Some(remark.to_string()),
        UnixTimeMs(t),
    )
    .unwrap()
}

fn seeded_store() -> DutyStore {
    let mut s = DutyStore::new_in_memory();
    s.upsert_subject_row(
        Subject::v1(
            subject_id("stu_001"),
            "Asha Rao".to_string(),
            period("sem4"),
            vec![period("sem3")],
        )
        .unwrap(),
    )
    .unwrap();
    s
}

#[test]
fn at_duty_requests_db_01_insert_requires_known_subject() {
    let mut s = DutyStore::new_in_memory();
    let err = s.insert_request_row(request("req_1", 1_000_000)).unwrap_err();
    assert!(matches!(
        err,
        StorageError::ForeignKeyViolation { table: "requests", .. }
    ));
}

#[test]
fn at_duty_requests_db_02_duplicate_id_refused() {
    let mut s = seeded_store();
    s.insert_request_row(request("req_1", 1_000_000)).unwrap();

    let err = s.insert_request_row(request("req_1", 9_000_000)).unwrap_err();
    assert!(matches!(
        err,
        StorageError::DuplicateKey { table: "requests", .. }
    ));
}

#[test]
fn at_duty_requests_db_03_identical_resubmission_refused_by_fingerprint() {
    let mut s = seeded_store();
    s.insert_request_row(request("req_1", 1_000_000)).unwrap();

    // Same subject, period, and window under a fresh id: double submit.
    let err = s.insert_request_row(request("req_2", 1_000_000)).unwrap_err();
    assert!(matches!(
        err,
        StorageError::DuplicateKey {
            table: "submission_fingerprints",
            ..
        }
    ));

    // A different window is a different submission.
    s.insert_request_row(request("req_3", 2_000_000)).unwrap();
    assert_eq!(s.request_count(&subject_id("stu_001"), &period("sem4")), 2);
}

#[test]
fn at_duty_requests_db_04_predecided_submission_refused() {
    let mut s = seeded_store();
    let mut record = request("req_1", 1_000_000);
    record
        .set_review(
            ReviewRole::Primary,
            ReviewDecision::v1(
                ReviewRole::Primary,
                ReviewVerdict::Approved,
                None,
                UnixTimeMs(2_000_000),
            )
            .unwrap()
            .to_record(),
        )
        .unwrap();

    let err = s.insert_request_row(record).unwrap_err();
    assert!(matches!(err, StorageError::ContractViolation(_)));
}

#[test]
fn at_duty_requests_db_05_two_stage_approval_settles_in_place() {
    let mut s = seeded_store();
    let shared = s.insert_request_row(request("req_1", 1_000_000)).unwrap();
    let created_at = shared.borrow().created_at;

    s.apply_review_decision(&request_id("req_1"), approve(ReviewRole::Primary, 2_000_000))
        .unwrap();
    assert_eq!(shared.borrow().status, RequestStatus::Pending);

    s.apply_review_decision(
        &request_id("req_1"),
        approve(ReviewRole::Secondary, 3_000_000),
    )
    .unwrap();

    // The same shared row the insert returned reflects the outcome.
    assert_eq!(shared.borrow().status, RequestStatus::Approved);
    assert_eq!(shared.borrow().created_at, created_at);
}

#[test]
fn at_duty_requests_db_06_single_rejection_settles_request() {
    let mut s = seeded_store();
    let shared = s.insert_request_row(request("req_1", 1_000_000)).unwrap();

    s.apply_review_decision(
        &request_id("req_1"),
        reject(ReviewRole::Secondary, "clashes with exams", 2_000_000),
    )
    .unwrap();
    assert_eq!(shared.borrow().status, RequestStatus::Rejected);
    assert_eq!(
        shared.borrow().secondary_review.remark.as_deref(),
        Some("clashes with exams")
    );
}

#[test]
fn at_duty_requests_db_07_decisions_on_settled_request_conflict() {
    let mut s = seeded_store();
    s.insert_request_row(request("req_1", 1_000_000)).unwrap();
    s.apply_review_decision(
        &request_id("req_1"),
        reject(ReviewRole::Primary, "no cover arranged", 2_000_000),
    )
    .unwrap();

    let err = s
        .apply_review_decision(
            &request_id("req_1"),
            approve(ReviewRole::Secondary, 3_000_000),
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::DecisionConflict { .. }));
}

#[test]
fn at_duty_requests_db_08_stage_cannot_be_decided_twice() {
    let mut s = seeded_store();
    s.insert_request_row(request("req_1", 1_000_000)).unwrap();
    s.apply_review_decision(&request_id("req_1"), approve(ReviewRole::Primary, 2_000_000))
        .unwrap();

    let err = s
        .apply_review_decision(&request_id("req_1"), approve(ReviewRole::Primary, 3_000_000))
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::DecisionConflict {
            reason: "stage has already been decided",
            ..
        }
    ));
}

#[test]
fn at_duty_requests_db_09_unknown_request_is_not_found() {
    let mut s = seeded_store();
    let err = s
        .apply_review_decision(&request_id("req_404"), approve(ReviewRole::Primary, 1))
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { table: "requests", .. }));
}

#[test]
fn at_duty_requests_db_10_recent_requests_most_recent_first_and_capped() {
    let mut s = seeded_store();
    for i in 0..5u64 {
        s.insert_request_row(request(&format!("req_{i}"), 1_000_000 + i * 86_400_000))
            .unwrap();
    }

    let recent = s.recent_requests(&subject_id("stu_001"), &period("sem4"), 3);
    let ids: Vec<String> = recent
        .iter()
        .map(|r| r.borrow().id.as_str().to_string())
        .collect();
    assert_eq!(
        ids,
        vec!["req_4".to_string(), "req_3".to_string(), "req_2".to_string()]
    );

    let empty = s.recent_requests(&subject_id("stu_001"), &period("sem1"), 3);
    assert!(empty.is_empty());
}

#[test]
fn at_duty_requests_db_11_request_count_tracks_all_rows() {
    let mut s = seeded_store();
    for i in 0..10u64 {
        s.insert_request_row(request(&format!("req_{i}"), 1_000_000 + i * 86_400_000))
            .unwrap();
    }

    // The count is the quota signal; it keeps growing past any index cap.
    assert_eq!(s.request_count(&subject_id("stu_001"), &period("sem4")), 10);
    assert_eq!(s.request_count(&subject_id("stu_001"), &period("sem3")), 0);
}
