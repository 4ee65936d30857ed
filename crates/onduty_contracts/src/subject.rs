#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{validate_id, validate_text, ContractViolation, Validate};

#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
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

impl Validate for SubjectId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("subject_id", &self.0, 64)
    }
}

/// Semester-style period marker, e.g. "sem4". One subject has exactly one
/// current marker and zero or more prior markers.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeriodMarker(String);

impl PeriodMarker {
    pub fn new(marker: impl Into<String>) -> Result<Self, ContractViolation> {
        let marker = marker.into();
        let v = Self(marker);
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for PeriodMarker {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("period_marker", &self.0, 32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub display_name: String,
    pub current_period: PeriodMarker,
    pub prior_periods: Vec<PeriodMarker>,
}

impl Subject {
    pub fn v1(
        id: SubjectId,
        display_name: String,
        current_period: PeriodMarker,
        prior_periods: Vec<PeriodMarker>,
    ) -> Result<Self, ContractViolation> {
        let subject = Self {
            id,
            display_name,
            current_period,
            prior_periods,
        };
        subject.validate()?;
        Ok(subject)
    }

    /// Current period first, then priors in their stored order.
    pub fn all_periods(&self) -> impl Iterator<Item = &PeriodMarker> {
        std::iter::once(&self.current_period).chain(self.prior_periods.iter())
    }
}

impl Validate for Subject {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.id.validate()?;
        validate_text("subject.display_name", &self.display_name, 128)?;
        self.current_period.validate()?;
        for period in &self.prior_periods {
            period.validate()?;
            if *period == self.current_period {
                return Err(ContractViolation::InvalidValue {
                    field: "subject.prior_periods",
                    reason: "must not repeat the current period",
                });
            }
        }
        for (i, period) in self.prior_periods.iter().enumerate() {
            if self.prior_periods[..i].contains(period) {
                return Err(ContractViolation::InvalidValue {
                    field: "subject.prior_periods",
                    reason: "must not contain duplicates",
                });
            }
        }
        Ok(())
    }
}
