#![forbid(unsafe_code)]

use std::rc::Rc;

use onduty_contracts::{
    ApprovalRequest, PeriodMarker, RequestId, ReviewDecision, Reviewer, ReviewerId, Subject,
    SubjectId,
};
use onduty_storage::{DutyDirectoryRepo, DutyRequestRepo, SharedApprovalRequest, StorageError};

use crate::history_queue::DEFAULT_HISTORY_CAPACITY;
use crate::tree::{GroupHistoryEntry, RequestIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    pub history_capacity: usize,
}

impl IndexConfig {
    pub fn mvp_v1() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Query or mutation before `initialize` completed. A programming
    /// error at the call site, surfaced loudly: an empty result here would
    /// be indistinguishable from "no data".
    Uninitialized,
    /// The backing-store write failed; propagated unchanged. No tree
    /// mutation has happened when this is returned.
    Persist(StorageError),
}

impl From<StorageError> for IndexError {
    fn from(e: StorageError) -> Self {
        IndexError::Persist(e)
    }
}

/// The process-wide gate in front of one `RequestIndex`. The host constructs
/// exactly one at startup and threads it to consumers; tests construct their
/// own. All writes go store-first: nothing touches the tree until the repo
/// call has returned successfully.
#[derive(Debug)]
pub struct IndexManager {
    config: IndexConfig,
    index: Option<RequestIndex>,
}

impl IndexManager {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            index: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    /// Builds the index exactly once; later calls are no-ops, so startup
    /// paths may call this freely without duplicating queue entries.
    pub fn initialize(
        &mut self,
        subjects: &[Rc<Subject>],
        reviewers: &[Rc<Reviewer>],
        repo: &impl DutyRequestRepo,
    ) {
        if self.index.is_some() {
            return;
        }
        self.index = Some(RequestIndex::initialize_from_store(
            subjects,
            reviewers,
            repo,
            self.config.history_capacity,
        ));
    }

    /// Single-walk startup path: reads the people tables and the request
    /// history out of one store.
    pub fn initialize_from_repo<R>(&mut self, repo: &R)
    where
        R: DutyDirectoryRepo + DutyRequestRepo,
    {
        if self.index.is_some() {
            return;
        }
        let subjects = repo.subject_rows();
        let reviewers = repo.reviewer_rows();
        self.initialize(&subjects, &reviewers, repo);
    }

    pub fn subject_history(
        &self,
        subject_id: &SubjectId,
        period: &PeriodMarker,
    ) -> Result<Vec<ApprovalRequest>, IndexError> {
        Ok(self.ready()?.subject_history(subject_id, period))
    }

    pub fn primary_group_history(
        &self,
        reviewer_id: &ReviewerId,
    ) -> Result<Vec<GroupHistoryEntry>, IndexError> {
        Ok(self.ready()?.primary_group_history(reviewer_id))
    }

    pub fn secondary_group_history(
        &self,
        reviewer_id: &ReviewerId,
    ) -> Result<Vec<GroupHistoryEntry>, IndexError> {
        Ok(self.ready()?.secondary_group_history(reviewer_id))
    }

    /// Persist-then-patch. A repo failure aborts before any tree mutation,
    /// so the index never diverges from a write that never committed.
    pub fn insert_request(
        &mut self,
        repo: &mut impl DutyRequestRepo,
        record: ApprovalRequest,
    ) -> Result<SharedApprovalRequest, IndexError> {
        if self.index.is_none() {
            return Err(IndexError::Uninitialized);
        }
        let shared = repo.persist_request(record)?;
        if let Some(index) = self.index.as_mut() {
            index.insert_request(&shared);
        }
        Ok(shared)
    }

    /// Store-only: queue entries alias the row the store just mutated, so
    /// readers re-derive the new status for free and no tree surgery is
    /// needed.
    pub fn update_status(
        &mut self,
        repo: &mut impl DutyRequestRepo,
        request_id: &RequestId,
        decision: ReviewDecision,
    ) -> Result<SharedApprovalRequest, IndexError> {
        if self.index.is_none() {
            return Err(IndexError::Uninitialized);
        }
        Ok(repo.persist_decision(request_id, decision)?)
    }

    fn ready(&self) -> Result<&RequestIndex, IndexError> {
        self.index.as_ref().ok_or(IndexError::Uninitialized)
    }
}
