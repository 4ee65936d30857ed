#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use onduty_contracts::{
    ApprovalRequest, DaySession, PeriodMarker, RequestId, RequestStatus, ReviewDecision,
    ReviewRole, ReviewVerdict, Reviewer, ReviewerId, Subject, SubjectId, UnixTimeMs,
};
use onduty_index::{IndexConfig, IndexError, IndexManager};
use onduty_storage::DutyStore;

fn subject_id(id: &str) -> SubjectId {
    SubjectId::new(id).unwrap()
}

fn period(marker: &str) -> PeriodMarker {
    PeriodMarker::new(marker).unwrap()
}

fn reviewer_id(id: &str) -> ReviewerId {
    ReviewerId::new(id).unwrap()
}

fn request(id: &str, start_ms: u64) -> ApprovalRequest {
    ApprovalRequest::v1(
        RequestId::new(id).unwrap(),
        subject_id("stu_s"),
        period("sem4"),
        UnixTimeMs(start_ms),
        DaySession::Am,
        UnixTimeMs(start_ms + 43_200_000),
        DaySession::Pm,
        "inter-college sports duty".to_string(),
        Vec::new(),
        UnixTimeMs(start_ms - 5_000),
    )
    .unwrap()
}

/// Full dashboard lifecycle: empty start, first insert visible in both the
/// subject view and the mentor's primary mirror, rotation past the queue cap,
/// then an in-place status change visible with no extra index write.
#[test]
fn at_dashboard_flow_01_full_request_lifecycle() {
    let mut store = DutyStore::new_in_memory();
    store
        .upsert_subject_row(
            Subject::v1(
                subject_id("stu_s"),
                "Sahana Pillai".to_string(),
                period("sem4"),
                Vec::new(),
            )
            .unwrap(),
        )
        .unwrap();
    store
        .upsert_reviewer_row(
            Reviewer::v1(
                reviewer_id("rev_t"),
                "Prof. Thomas".to_string(),
                BTreeSet::from([subject_id("stu_s")]),
                BTreeSet::new(),
            )
            .unwrap(),
        )
        .unwrap();

    let mut manager = IndexManager::new(IndexConfig::mvp_v1());

    // Before initialize: loud refusal, not silently-empty data.
    assert_eq!(
        manager.subject_history(&subject_id("stu_s"), &period("sem4")),
        Err(IndexError::Uninitialized)
    );

    manager.initialize(&store.subject_rows(), &store.reviewer_rows(), &store);
    assert!(manager
        .subject_history(&subject_id("stu_s"), &period("sem4"))
        .unwrap()
        .is_empty());

    // First submission shows up in the subject's own history and in the
    // mentor's primary mirror, and nowhere in the secondary mirror.
    manager.insert_request(&mut store, request("req_01", 1_000_000)).unwrap();

    let own = manager
        .subject_history(&subject_id("stu_s"), &period("sem4"))
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id.as_str(), "req_01");

    let primary = manager.primary_group_history(&reviewer_id("rev_t")).unwrap();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0].subject.id, subject_id("stu_s"));
    assert_eq!(primary[0].period, period("sem4"));
    assert_eq!(primary[0].requests.len(), 1);
    assert_eq!(primary[0].requests[0].id.as_str(), "req_01");
    assert!(manager
        .secondary_group_history(&reviewer_id("rev_t"))
        .unwrap()
        .is_empty());

    // Eight more submissions rotate the capacity-8 queue: req_01 evicted,
    // req_02..req_09 retained oldest-first, in both views.
    for i in 2..=9u64 {
        manager
            .insert_request(&mut store, request(&format!("req_{i:02}"), 1_000_000 + i * 86_400_000))
            .unwrap();
    }

    let own = manager
        .subject_history(&subject_id("stu_s"), &period("sem4"))
        .unwrap();
    assert_eq!(own.len(), 8);
    assert_eq!(own.first().map(|r| r.id.as_str()), Some("req_02"));
    assert_eq!(own.last().map(|r| r.id.as_str()), Some("req_09"));

    let primary = manager.primary_group_history(&reviewer_id("rev_t")).unwrap();
    assert_eq!(primary[0].requests.len(), 8);

    // The store keeps every row; only the index view is capped.
    assert_eq!(store.request_count(&subject_id("stu_s"), &period("sem4")), 9);

    // Mentor then advisor approve req_05: no tree surgery, both dashboard
    // views re-derive the settled status from the shared store row.
    for (role, t) in [
        (ReviewRole::Primary, 900_000_000),
        (ReviewRole::Secondary, 900_100_000),
    ] {
        manager
            .update_status(
                &mut store,
                &RequestId::new("req_05").unwrap(),
                ReviewDecision::v1(role, ReviewVerdict::Approved, None, UnixTimeMs(t)).unwrap(),
            )
            .unwrap();
    }

    let own = manager
        .subject_history(&subject_id("stu_s"), &period("sem4"))
        .unwrap();
    let settled = own.iter().find(|r| r.id.as_str() == "req_05").unwrap();
    assert_eq!(settled.status, RequestStatus::Approved);

    let primary = manager.primary_group_history(&reviewer_id("rev_t")).unwrap();
    let mirrored = primary[0]
        .requests
        .iter()
        .find(|r| r.id.as_str() == "req_05")
        .unwrap();
    assert_eq!(mirrored.status, RequestStatus::Approved);
}
