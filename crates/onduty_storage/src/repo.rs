#![forbid(unsafe_code)]

use std::rc::Rc;

use onduty_contracts::{
    ApprovalRequest, PeriodMarker, RequestId, ReviewDecision, Reviewer, Subject, SubjectId,
};

use crate::store::{DutyStore, SharedApprovalRequest, StorageError};

/// Read access to the people tables, for index construction at startup.
pub trait DutyDirectoryRepo {
    fn subject_rows(&self) -> Vec<Rc<Subject>>;
    fn reviewer_rows(&self) -> Vec<Rc<Reviewer>>;
}

/// The request-side contract the index synchronizes against: one capped
/// most-recent-first fetch, and the two persist calls that must succeed
/// before any index mutation is attempted.
pub trait DutyRequestRepo {
    fn recent_requests(
        &self,
        subject_id: &SubjectId,
        period: &PeriodMarker,
        limit: usize,
    ) -> Vec<SharedApprovalRequest>;

    fn persist_request(
        &mut self,
        record: ApprovalRequest,
    ) -> Result<SharedApprovalRequest, StorageError>;

    fn persist_decision(
        &mut self,
        request_id: &RequestId,
        decision: ReviewDecision,
    ) -> Result<SharedApprovalRequest, StorageError>;
}

impl DutyDirectoryRepo for DutyStore {
    fn subject_rows(&self) -> Vec<Rc<Subject>> {
        DutyStore::subject_rows(self)
    }

    fn reviewer_rows(&self) -> Vec<Rc<Reviewer>> {
        DutyStore::reviewer_rows(self)
    }
}

impl DutyRequestRepo for DutyStore {
    fn recent_requests(
        &self,
        subject_id: &SubjectId,
        period: &PeriodMarker,
        limit: usize,
    ) -> Vec<SharedApprovalRequest> {
        DutyStore::recent_requests(self, subject_id, period, limit)
    }

    fn persist_request(
        &mut self,
        record: ApprovalRequest,
    ) -> Result<SharedApprovalRequest, StorageError> {
        self.insert_request_row(record)
    }

    fn persist_decision(
        &mut self,
        request_id: &RequestId,
        decision: ReviewDecision,
    ) -> Result<SharedApprovalRequest, StorageError> {
        self.apply_review_decision(request_id, decision)
    }
}
