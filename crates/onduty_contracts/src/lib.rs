#![forbid(unsafe_code)]

pub mod common;
pub mod request;
pub mod reviewer;
pub mod subject;

pub use common::{ContractViolation, UnixTimeMs, Validate};
pub use request::{
    derive_status, ApprovalRequest, AttachmentRef, DaySession, RequestId, RequestStatus,
    ReviewDecision, ReviewRecord, ReviewVerdict,
};
pub use reviewer::{Reviewer, ReviewerId, ReviewRole};
pub use subject::{PeriodMarker, Subject, SubjectId};
