#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::{validate_id, validate_text, ContractViolation, Validate};
use crate::subject::SubjectId;

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReviewerId(String);

impl ReviewerId {
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

impl Validate for ReviewerId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("reviewer_id", &self.0, 64)
    }
}

/// The two independent review stages. Primary is the mentor stage, secondary
/// the class-advisor stage; a request clears only after both approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRole {
    Primary,
    Secondary,
}

impl ReviewRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewRole::Primary => "primary",
            ReviewRole::Secondary => "secondary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: ReviewerId,
    pub display_name: String,
    pub primary_subjects: BTreeSet<SubjectId>,
    pub secondary_subjects: BTreeSet<SubjectId>,
}

impl Reviewer {
    pub fn v1(
        id: ReviewerId,
        display_name: String,
        primary_subjects: BTreeSet<SubjectId>,
        secondary_subjects: BTreeSet<SubjectId>,
    ) -> Result<Self, ContractViolation> {
        let reviewer = Self {
            id,
            display_name,
            primary_subjects,
            secondary_subjects,
        };
        reviewer.validate()?;
        Ok(reviewer)
    }

    pub fn assigned(&self, role: ReviewRole) -> &BTreeSet<SubjectId> {
        match role {
            ReviewRole::Primary => &self.primary_subjects,
            ReviewRole::Secondary => &self.secondary_subjects,
        }
    }

    pub fn is_assigned(&self, role: ReviewRole, subject_id: &SubjectId) -> bool {
        self.assigned(role).contains(subject_id)
    }
}

impl Validate for Reviewer {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.id.validate()?;
        validate_text("reviewer.display_name", &self.display_name, 128)?;
        for subject_id in self.primary_subjects.iter().chain(self.secondary_subjects.iter()) {
            subject_id.validate()?;
        }
        Ok(())
    }
}
