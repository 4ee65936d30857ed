#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use onduty_contracts::{
    ApprovalRequest, ContractViolation, PeriodMarker, RequestId, RequestStatus, ReviewDecision,
    ReviewVerdict, Reviewer, ReviewerId, Subject, SubjectId, Validate,
};

/// Handle to one authoritative request row. The store owns the row; every
/// index position that mentions the request clones this handle, so an
/// in-place status write is visible everywhere without propagation.
pub type SharedApprovalRequest = Rc<RefCell<ApprovalRequest>>;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    DuplicateKey {
        table: &'static str,
        key: String,
    },
    ForeignKeyViolation {
        table: &'static str,
        key: String,
    },
    NotFound {
        table: &'static str,
        key: String,
    },
    DecisionConflict {
        request_id: String,
        reason: &'static str,
    },
    ContractViolation(ContractViolation),
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

/// Single-process authoritative store for subjects, reviewers, and approval
/// requests. The index layer never reads past this store at query time; it
/// synchronizes against it at startup and on every write.
#[derive(Debug, Default)]
pub struct DutyStore {
    subjects: BTreeMap<SubjectId, Rc<Subject>>,
    reviewers: BTreeMap<ReviewerId, Rc<Reviewer>>,
    requests: BTreeMap<RequestId, SharedApprovalRequest>,
    // (subject, period) -> request ids in submission order.
    requests_by_subject_period: BTreeMap<(SubjectId, PeriodMarker), Vec<RequestId>>,
    // Double-submit guard: content fingerprint -> the request that owns it.
    submission_fingerprints: BTreeMap<String, RequestId>,
}

impl DutyStore {
    pub fn new_in_memory() -> Self {
        Self {
            subjects: BTreeMap::new(),
            reviewers: BTreeMap::new(),
            requests: BTreeMap::new(),
            requests_by_subject_period: BTreeMap::new(),
            submission_fingerprints: BTreeMap::new(),
        }
    }

    pub fn upsert_subject_row(&mut self, subject: Subject) -> Result<Rc<Subject>, StorageError> {
        subject.validate()?;
        let handle = Rc::new(subject);
        self.subjects.insert(handle.id.clone(), Rc::clone(&handle));
        Ok(handle)
    }

    pub fn upsert_reviewer_row(
        &mut self,
        reviewer: Reviewer,
    ) -> Result<Rc<Reviewer>, StorageError> {
        reviewer.validate()?;
        for subject_id in reviewer
            .primary_subjects
            .iter()
            .chain(reviewer.secondary_subjects.iter())
        {
            if !self.subjects.contains_key(subject_id) {
                return Err(StorageError::ForeignKeyViolation {
                    table: "reviewers",
                    key: subject_id.as_str().to_string(),
                });
            }
        }
        let handle = Rc::new(reviewer);
        self.reviewers.insert(handle.id.clone(), Rc::clone(&handle));
        Ok(handle)
    }

    pub fn subject_row(&self, subject_id: &SubjectId) -> Option<Rc<Subject>> {
        self.subjects.get(subject_id).cloned()
    }

    pub fn reviewer_row(&self, reviewer_id: &ReviewerId) -> Option<Rc<Reviewer>> {
        self.reviewers.get(reviewer_id).cloned()
    }

    pub fn subject_rows(&self) -> Vec<Rc<Subject>> {
        self.subjects.values().cloned().collect()
    }

    pub fn reviewer_rows(&self) -> Vec<Rc<Reviewer>> {
        self.reviewers.values().cloned().collect()
    }

    pub fn request_row(&self, request_id: &RequestId) -> Option<SharedApprovalRequest> {
        self.requests.get(request_id).cloned()
    }

    /// Durably records a new submission. The record must be fully pending;
    /// decisions arrive only through `apply_review_decision`.
    pub fn insert_request_row(
        &mut self,
        record: ApprovalRequest,
    ) -> Result<SharedApprovalRequest, StorageError> {
        record.validate()?;
        if record.status != RequestStatus::Pending
            || record.primary_review.verdict != ReviewVerdict::Pending
            || record.secondary_review.verdict != ReviewVerdict::Pending
        {
            return Err(StorageError::ContractViolation(
                ContractViolation::InvalidValue {
                    field: "approval_request.status",
                    reason: "new submissions must be fully pending",
                },
            ));
        }
        if !self.subjects.contains_key(&record.subject_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: "requests",
                key: record.subject_id.as_str().to_string(),
            });
        }
        if self.requests.contains_key(&record.id) {
            return Err(StorageError::DuplicateKey {
                table: "requests",
                key: record.id.as_str().to_string(),
            });
        }
        let fingerprint = submission_fingerprint(&record);
        if self.submission_fingerprints.contains_key(&fingerprint) {
            return Err(StorageError::DuplicateKey {
                table: "submission_fingerprints",
                key: fingerprint,
            });
        }

        let request_id = record.id.clone();
        let pair = (record.subject_id.clone(), record.period.clone());
        let shared: SharedApprovalRequest = Rc::new(RefCell::new(record));
        self.requests.insert(request_id.clone(), Rc::clone(&shared));
        self.requests_by_subject_period
            .entry(pair)
            .or_default()
            .push(request_id.clone());
        self.submission_fingerprints.insert(fingerprint, request_id);
        Ok(shared)
    }

    /// Applies one review stage's decision and re-derives the overall status
    /// in place on the shared row. `created_at` is never touched.
    pub fn apply_review_decision(
        &mut self,
        request_id: &RequestId,
        decision: ReviewDecision,
    ) -> Result<SharedApprovalRequest, StorageError> {
        decision.validate()?;
        let shared = self
            .requests
            .get(request_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                table: "requests",
                key: request_id.as_str().to_string(),
            })?;
        {
            let mut row = shared.borrow_mut();
            if row.is_final() {
                return Err(StorageError::DecisionConflict {
                    request_id: request_id.as_str().to_string(),
                    reason: "overall status is already settled",
                });
            }
            if row.review(decision.role).verdict != ReviewVerdict::Pending {
                return Err(StorageError::DecisionConflict {
                    request_id: request_id.as_str().to_string(),
                    reason: "stage has already been decided",
                });
            }
            row.set_review(decision.role, decision.to_record())?;
        }
        Ok(shared)
    }

    /// Most-recent-first by start time (ties broken by id for determinism),
    /// capped at `limit`. This is the fetch function the index builds from.
    pub fn recent_requests(
        &self,
        subject_id: &SubjectId,
        period: &PeriodMarker,
        limit: usize,
    ) -> Vec<SharedApprovalRequest> {
        let Some(ids) = self
            .requests_by_subject_period
            .get(&(subject_id.clone(), period.clone()))
        else {
            return Vec::new();
        };
        let mut rows: Vec<SharedApprovalRequest> = ids
            .iter()
            .filter_map(|id| self.requests.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| {
            let (a, b) = (a.borrow(), b.borrow());
            b.start_at.cmp(&a.start_at).then_with(|| a.id.cmp(&b.id))
        });
        rows.truncate(limit);
        rows
    }

    /// Total rows for the pair. The bounded index queue is capped storage,
    /// not a quota gate; per-period cap checks count here instead.
    pub fn request_count(&self, subject_id: &SubjectId, period: &PeriodMarker) -> usize {
        self.requests_by_subject_period
            .get(&(subject_id.clone(), period.clone()))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn submission_fingerprint(record: &ApprovalRequest) -> String {
    let mut hasher = Sha256::new();
    for part in [
        record.subject_id.as_str(),
        record.period.as_str(),
        record.start_session.as_str(),
        record.end_session.as_str(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    hasher.update(record.start_at.0.to_be_bytes());
    hasher.update(record.end_at.0.to_be_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
