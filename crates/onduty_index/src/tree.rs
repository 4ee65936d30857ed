#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

use onduty_contracts::{
    ApprovalRequest, PeriodMarker, ReviewRole, Reviewer, ReviewerId, Subject, SubjectId,
};
use onduty_storage::{DutyRequestRepo, SharedApprovalRequest};

use crate::node::{IndexNode, NodeKind, NodePayload};

pub(crate) const SUBJECTS_BRANCH: &str = "subjects";
pub(crate) const REVIEWERS_BRANCH: &str = "reviewers";
pub(crate) const PRIMARY_GROUP: &str = "primary-group";
pub(crate) const SECONDARY_GROUP: &str = "secondary-group";

/// One (subject, period) slice of a reviewer's mirrored view. Plain owned
/// data, ready for the HTTP layer to serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupHistoryEntry {
    pub subject: Subject,
    pub period: PeriodMarker,
    pub requests: Vec<ApprovalRequest>,
}

/// The derived hierarchy: root -> {subjects, reviewers}. Subject nodes carry
/// one period child per known period; each period node owns a bounded queue.
/// Reviewer nodes mirror their assigned subjects under primary/secondary
/// group nodes, sharing subject data and request handles with the subjects
/// branch rather than copying them.
#[derive(Debug, Clone)]
pub struct RequestIndex {
    root: IndexNode,
    history_capacity: usize,
}

impl RequestIndex {
    /// One-time build pass over the backing store. Runs once per process
    /// lifetime, so the subjects x periods (+ mirrors) walk is acceptable.
    pub fn initialize_from_store(
        subjects: &[Rc<Subject>],
        reviewers: &[Rc<Reviewer>],
        repo: &impl DutyRequestRepo,
        history_capacity: usize,
    ) -> Self {
        let history_capacity = history_capacity.max(1);
        let mut root = IndexNode::new(NodeKind::Root);

        let mut subjects_branch = IndexNode::new(NodeKind::Subjects);
        for subject in subjects {
            subjects_branch.add_child(
                subject.id.as_str(),
                build_subject_node(subject, repo, history_capacity),
            );
        }
        root.add_child(SUBJECTS_BRANCH, subjects_branch);

        let by_id: BTreeMap<&SubjectId, &Rc<Subject>> =
            subjects.iter().map(|s| (&s.id, s)).collect();
        let mut reviewers_branch = IndexNode::new(NodeKind::Reviewers);
        for reviewer in reviewers {
            let mut reviewer_node = IndexNode::with_payload(
                NodeKind::Reviewer,
                NodePayload::Reviewer(Rc::clone(reviewer)),
            );
            for (group_name, group_kind, role) in [
                (PRIMARY_GROUP, NodeKind::PrimaryGroup, ReviewRole::Primary),
                (
                    SECONDARY_GROUP,
                    NodeKind::SecondaryGroup,
                    ReviewRole::Secondary,
                ),
            ] {
                let mut group_node = IndexNode::new(group_kind);
                for subject_id in reviewer.assigned(role) {
                    // Assignments pointing at unknown subjects are skipped;
                    // the store's foreign keys make this unreachable in
                    // practice.
                    if let Some(subject) = by_id.get(subject_id) {
                        group_node.add_child(
                            subject_id.as_str(),
                            build_subject_node(subject, repo, history_capacity),
                        );
                    }
                }
                reviewer_node.add_child(group_name, group_node);
            }
            reviewers_branch.add_child(reviewer.id.as_str(), reviewer_node);
        }
        root.add_child(REVIEWERS_BRANCH, reviewers_branch);

        Self {
            root,
            history_capacity,
        }
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn root(&self) -> &IndexNode {
        &self.root
    }

    /// Queue snapshot at subjects -> subject -> period; empty when any path
    /// segment is absent.
    pub fn subject_history(
        &self,
        subject_id: &SubjectId,
        period: &PeriodMarker,
    ) -> Vec<ApprovalRequest> {
        self.root
            .child(SUBJECTS_BRANCH)
            .and_then(|branch| branch.child(subject_id.as_str()))
            .and_then(|subject_node| subject_node.child(period.as_str()))
            .and_then(IndexNode::queue)
            .map(|queue| queue.snapshot())
            .unwrap_or_default()
    }

    pub fn primary_group_history(&self, reviewer_id: &ReviewerId) -> Vec<GroupHistoryEntry> {
        self.group_history(reviewer_id, PRIMARY_GROUP)
    }

    pub fn secondary_group_history(&self, reviewer_id: &ReviewerId) -> Vec<GroupHistoryEntry> {
        self.group_history(reviewer_id, SECONDARY_GROUP)
    }

    fn group_history(&self, reviewer_id: &ReviewerId, group: &str) -> Vec<GroupHistoryEntry> {
        let Some(group_node) = self
            .root
            .child(REVIEWERS_BRANCH)
            .and_then(|branch| branch.child(reviewer_id.as_str()))
            .and_then(|reviewer_node| reviewer_node.child(group))
        else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        for (_, subject_node) in group_node.children() {
            let Some(subject) = subject_node.subject_payload() else {
                continue;
            };
            for (_, period_node) in subject_node.children() {
                let (Some(period), Some(queue)) =
                    (period_node.period_payload(), period_node.queue())
                else {
                    continue;
                };
                entries.push(GroupHistoryEntry {
                    subject: Subject::clone(subject),
                    period: period.clone(),
                    requests: queue.snapshot(),
                });
            }
        }
        entries
    }

    /// Write-through patch for a request the store has already persisted.
    /// The handle lands in up to three kinds of places: the subject's own
    /// period queue and each reviewer group that carries the subject. Every
    /// level is created on demand so a newly started period is never
    /// silently dropped. Pure in-memory; cannot fail.
    pub fn insert_request(&mut self, shared: &SharedApprovalRequest) {
        let (subject_id, period) = {
            let row = shared.borrow();
            (row.subject_id.clone(), row.period.clone())
        };
        let capacity = self.history_capacity;

        if let Some(branch) = self.root.child_mut(SUBJECTS_BRANCH) {
            let subject_node = branch
                .ensure_child_with(subject_id.as_str(), || IndexNode::new(NodeKind::Subject));
            enqueue_under_period(subject_node, &period, capacity, shared);
        }

        if let Some(branch) = self.root.child_mut(REVIEWERS_BRANCH) {
            for (_, reviewer_node) in branch.children_mut() {
                for group in [PRIMARY_GROUP, SECONDARY_GROUP] {
                    let Some(group_node) = reviewer_node.child_mut(group) else {
                        continue;
                    };
                    if let Some(subject_node) = group_node.child_mut(subject_id.as_str()) {
                        enqueue_under_period(subject_node, &period, capacity, shared);
                    }
                }
            }
        }
    }
}

fn build_subject_node(
    subject: &Rc<Subject>,
    repo: &impl DutyRequestRepo,
    capacity: usize,
) -> IndexNode {
    let mut node =
        IndexNode::with_payload(NodeKind::Subject, NodePayload::Subject(Rc::clone(subject)));
    for period in subject.all_periods() {
        let mut period_node =
            IndexNode::with_payload(NodeKind::Period, NodePayload::Period(period.clone()));
        let queue = period_node.ensure_queue(capacity);
        // The store returns most-recent-first; enqueue oldest-first so the
        // queue's natural order matches recency with no extra bookkeeping.
        let recent = repo.recent_requests(&subject.id, period, capacity);
        for shared in recent.iter().rev() {
            queue.enqueue(Rc::clone(shared));
        }
        node.add_child(period.as_str(), period_node);
    }
    node
}

fn enqueue_under_period(
    subject_node: &mut IndexNode,
    period: &PeriodMarker,
    capacity: usize,
    shared: &SharedApprovalRequest,
) {
    let period_node = subject_node.ensure_child_with(period.as_str(), || {
        IndexNode::with_payload(NodeKind::Period, NodePayload::Period(period.clone()))
    });
    period_node.ensure_queue(capacity).enqueue(Rc::clone(shared));
}
