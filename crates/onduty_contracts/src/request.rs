#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{validate_id, validate_text, ContractViolation, UnixTimeMs, Validate};
use crate::reviewer::ReviewRole;
use crate::subject::{PeriodMarker, SubjectId};

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = id.into();
        let v = Self(id);
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for RequestId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("request_id", &self.0, 64)
    }
}

/// Opaque pointer into the collaborator-owned attachment store.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AttachmentRef(String);

impl AttachmentRef {
    pub fn new(reference: impl Into<String>) -> Result<Self, ContractViolation> {
        let reference = reference.into();
        let v = Self(reference);
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for AttachmentRef {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("attachment_ref", &self.0, 256)
    }
}

/// Half-day tag on each end of the leave window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaySession {
    Am,
    Pm,
    Full,
}

impl DaySession {
    pub fn as_str(self) -> &'static str {
        match self {
            DaySession::Am => "am",
            DaySession::Pm => "pm",
            DaySession::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Pending,
    Approved,
    Rejected,
}

impl ReviewVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewVerdict::Pending => "pending",
            ReviewVerdict::Approved => "approved",
            ReviewVerdict::Rejected => "rejected",
        }
    }
}

/// Overall status is derived, never stored independently: rejected as soon as
/// either stage rejects, approved only once both stages approve.
pub fn derive_status(primary: ReviewVerdict, secondary: ReviewVerdict) -> RequestStatus {
    if primary == ReviewVerdict::Rejected || secondary == ReviewVerdict::Rejected {
        return RequestStatus::Rejected;
    }
    if primary == ReviewVerdict::Approved && secondary == ReviewVerdict::Approved {
        return RequestStatus::Approved;
    }
    RequestStatus::Pending
}

/// One stage's decision state on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub verdict: ReviewVerdict,
    pub remark: Option<String>,
    pub decided_at: Option<UnixTimeMs>,
}

impl ReviewRecord {
    pub fn pending() -> Self {
        Self {
            verdict: ReviewVerdict::Pending,
            remark: None,
            decided_at: None,
        }
    }
}

impl Validate for ReviewRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self.verdict {
            ReviewVerdict::Pending => {
                if self.remark.is_some() {
                    return Err(ContractViolation::InvalidValue {
                        field: "review_record.remark",
                        reason: "must be absent while pending",
                    });
                }
                if self.decided_at.is_some() {
                    return Err(ContractViolation::InvalidValue {
                        field: "review_record.decided_at",
                        reason: "must be absent while pending",
                    });
                }
            }
            ReviewVerdict::Approved | ReviewVerdict::Rejected => {
                if self.decided_at.is_none() {
                    return Err(ContractViolation::InvalidValue {
                        field: "review_record.decided_at",
                        reason: "required once decided",
                    });
                }
            }
        }
        if self.verdict == ReviewVerdict::Rejected {
            match &self.remark {
                Some(remark) => validate_text("review_record.remark", remark, 512)?,
                None => {
                    return Err(ContractViolation::InvalidValue {
                        field: "review_record.remark",
                        reason: "mandatory when verdict is rejected",
                    })
                }
            }
        } else if let Some(remark) = &self.remark {
            validate_text("review_record.remark", remark, 512)?;
        }
        Ok(())
    }
}

/// Input contract for a status change: one role's verdict plus its remark.
/// Remark-on-reject is enforced here, at construction, so the rule cannot be
/// bypassed upstream of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub role: ReviewRole,
    pub verdict: ReviewVerdict,
    pub remark: Option<String>,
    pub decided_at: UnixTimeMs,
}

impl ReviewDecision {
    pub fn v1(
        role: ReviewRole,
        verdict: ReviewVerdict,
        remark: Option<String>,
        decided_at: UnixTimeMs,
    ) -> Result<Self, ContractViolation> {
        let decision = Self {
            role,
            verdict,
            remark,
            decided_at,
        };
        decision.validate()?;
        Ok(decision)
    }

    pub fn to_record(&self) -> ReviewRecord {
        ReviewRecord {
            verdict: self.verdict,
            remark: self.remark.clone(),
            decided_at: Some(self.decided_at),
        }
    }
}

impl Validate for ReviewDecision {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.verdict == ReviewVerdict::Pending {
            return Err(ContractViolation::InvalidValue {
                field: "review_decision.verdict",
                reason: "must be approved or rejected",
            });
        }
        self.to_record().validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: RequestId,
    pub subject_id: SubjectId,
    pub period: PeriodMarker,
    pub start_at: UnixTimeMs,
    pub start_session: DaySession,
    pub end_at: UnixTimeMs,
    pub end_session: DaySession,
    pub justification: String,
    pub attachments: Vec<AttachmentRef>,
    pub status: RequestStatus,
    pub primary_review: ReviewRecord,
    pub secondary_review: ReviewRecord,
    pub created_at: UnixTimeMs,
}

impl ApprovalRequest {
    /// New submission: both review stages pending, overall status pending.
    /// The id and creation timestamp are generated by the collaborator before
    /// the record reaches the core; `created_at` is never rewritten afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        id: RequestId,
        subject_id: SubjectId,
        period: PeriodMarker,
        start_at: UnixTimeMs,
        start_session: DaySession,
        end_at: UnixTimeMs,
        end_session: DaySession,
        justification: String,
        attachments: Vec<AttachmentRef>,
        created_at: UnixTimeMs,
    ) -> Result<Self, ContractViolation> {
        let request = Self {
            id,
            subject_id,
            period,
            start_at,
            start_session,
            end_at,
            end_session,
            justification,
            attachments,
            status: RequestStatus::Pending,
            primary_review: ReviewRecord::pending(),
            secondary_review: ReviewRecord::pending(),
            created_at,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn review(&self, role: ReviewRole) -> &ReviewRecord {
        match role {
            ReviewRole::Primary => &self.primary_review,
            ReviewRole::Secondary => &self.secondary_review,
        }
    }

    pub fn is_final(&self) -> bool {
        self.status != RequestStatus::Pending
    }

    /// Writes one stage's record and re-derives the overall status. Lifecycle
    /// rules (no re-deciding a settled stage, no decisions on a final request)
    /// belong to the store; this only keeps the record self-consistent.
    pub fn set_review(
        &mut self,
        role: ReviewRole,
        record: ReviewRecord,
    ) -> Result<(), ContractViolation> {
        record.validate()?;
        match role {
            ReviewRole::Primary => self.primary_review = record,
            ReviewRole::Secondary => self.secondary_review = record,
        }
        self.status = derive_status(self.primary_review.verdict, self.secondary_review.verdict);
        Ok(())
    }
}

impl Validate for ApprovalRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.id.validate()?;
        self.subject_id.validate()?;
        self.period.validate()?;
        if self.end_at < self.start_at {
            return Err(ContractViolation::InvalidValue {
                field: "approval_request.end_at",
                reason: "must not precede start_at",
            });
        }
        if self.start_at == self.end_at
            && self.start_session == DaySession::Pm
            && self.end_session == DaySession::Am
        {
            return Err(ContractViolation::InvalidValue {
                field: "approval_request.end_session",
                reason: "same-day window must not end before it starts",
            });
        }
        validate_text("approval_request.justification", &self.justification, 1024)?;
        if self.attachments.len() > 16 {
            return Err(ContractViolation::InvalidValue {
                field: "approval_request.attachments",
                reason: "too many attachment references",
            });
        }
        for attachment in &self.attachments {
            attachment.validate()?;
        }
        self.primary_review.validate()?;
        self.secondary_review.validate()?;
        if self.status != derive_status(self.primary_review.verdict, self.secondary_review.verdict)
        {
            return Err(ContractViolation::InvalidValue {
                field: "approval_request.status",
                reason: "must match the derived review outcome",
            });
        }
        Ok(())
    }
}
