#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use onduty_contracts::{PeriodMarker, Reviewer, ReviewerId, Subject, SubjectId};
use onduty_storage::{DutyStore, StorageError};

fn subject_id(id: &str) -> SubjectId {
    SubjectId::new(id).unwrap()
}

fn period(marker: &str) -> PeriodMarker {
    PeriodMarker::new(marker).unwrap()
}

fn subject(id: &str, name: &str) -> Subject {
    Subject::v1(
        subject_id(id),
        name.to_string(),
        period("sem4"),
        vec![period("sem3")],
    )
    .unwrap()
}

fn reviewer(id: &str, primary: &[&str], secondary: &[&str]) -> Reviewer {
    Reviewer::v1(
        ReviewerId::new(id).unwrap(),
        "Prof. Iyer".to_string(),
        primary.iter().map(|s| subject_id(s)).collect::<BTreeSet<_>>(),
        secondary
            .iter()
            .map(|s| subject_id(s))
            .collect::<BTreeSet<_>>(),
    )
    .unwrap()
}

#[test]
fn at_duty_people_db_01_subject_upsert_replaces_row() {
    let mut s = DutyStore::new_in_memory();
    s.upsert_subject_row(subject("stu_001", "Asha Rao")).unwrap();
    s.upsert_subject_row(subject("stu_001", "Asha R. Rao"))
        .unwrap();

    let row = s.subject_row(&subject_id("stu_001")).unwrap();
    assert_eq!(row.display_name, "Asha R. Rao");
    assert_eq!(s.subject_rows().len(), 1);
}

#[test]
fn at_duty_people_db_02_reviewer_upsert_requires_known_subjects() {
    let mut s = DutyStore::new_in_memory();
    s.upsert_subject_row(subject("stu_001", "Asha Rao")).unwrap();

    let err = s
        .upsert_reviewer_row(reviewer("rev_1", &["stu_001", "stu_404"], &[]))
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::ForeignKeyViolation { table: "reviewers", .. }
    ));
    assert!(s.reviewer_row(&ReviewerId::new("rev_1").unwrap()).is_none());
}

#[test]
fn at_duty_people_db_03_reviewer_roles_may_overlap() {
    let mut s = DutyStore::new_in_memory();
    s.upsert_subject_row(subject("stu_001", "Asha Rao")).unwrap();
    s.upsert_subject_row(subject("stu_002", "Vikram Shah"))
        .unwrap();

    let row = s
        .upsert_reviewer_row(reviewer("rev_1", &["stu_001", "stu_002"], &["stu_002"]))
        .unwrap();
    assert!(row.primary_subjects.contains(&subject_id("stu_002")));
    assert!(row.secondary_subjects.contains(&subject_id("stu_002")));
}

#[test]
fn at_duty_people_db_04_people_rows_iterate_in_id_order() {
    let mut s = DutyStore::new_in_memory();
    s.upsert_subject_row(subject("stu_b", "Beta")).unwrap();
    s.upsert_subject_row(subject("stu_a", "Alpha")).unwrap();

    let ids: Vec<String> = s
        .subject_rows()
        .iter()
        .map(|row| row.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["stu_a".to_string(), "stu_b".to_string()]);
}
