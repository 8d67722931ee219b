//! Inspection: a recorded check of a machine's condition.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{InspectionId, MachineId, UserId};
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Outcome of an [`Inspection`].
    InspectionResult {
        Pass => "PASS",
        Fail => "FAIL",
        NeedsAttention => "NEEDS_ATTENTION",
    }
}

impl InspectionResult {
    /// `FAIL` or `NEEDS_ATTENTION`.
    #[must_use]
    pub fn is_failure(self) -> bool {
        self != Self::Pass
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: InspectionId,
    pub machine_id: MachineId,
    pub inspector_id: UserId,
    pub title: String,
    pub findings: Option<String>,
    pub result: InspectionResult,
    pub inspection_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Inspection {
    pub const TITLE_MAX: usize = 200;

    /// Create a builder for constructing an [`Inspection`].
    #[must_use]
    pub fn builder() -> InspectionBuilder {
        InspectionBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the title is empty or too long.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("title", &self.title, Self::TITLE_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: InspectionPatch) -> Result<(), PmTrackError> {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(findings) = patch.findings {
            self.findings = Some(findings);
        }
        if let Some(result) = patch.result {
            self.result = result;
        }
        if let Some(date) = patch.inspection_date {
            self.inspection_date = date;
        }
        self.updated_at = now();
        self.validate()
    }
}

/// Partial update of an [`Inspection`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectionPatch {
    pub title: Option<String>,
    pub findings: Option<String>,
    pub result: Option<InspectionResult>,
    pub inspection_date: Option<Timestamp>,
}

/// Criteria for listing inspections. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionFilter {
    pub machine_id: Option<MachineId>,
    pub inspector_id: Option<UserId>,
    pub result: Option<InspectionResult>,
    /// Only `FAIL` and `NEEDS_ATTENTION` results.
    pub failed: bool,
}

impl InspectionFilter {
    #[must_use]
    pub fn matches(&self, inspection: &Inspection) -> bool {
        self.machine_id.is_none_or(|id| inspection.machine_id == id)
            && self.inspector_id.is_none_or(|id| inspection.inspector_id == id)
            && self.result.is_none_or(|result| inspection.result == result)
            && (!self.failed || inspection.result.is_failure())
    }
}

/// Counts of inspections per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InspectionSummary {
    pub total_inspections: u64,
    pub passed_inspections: u64,
    pub failed_inspections: u64,
    pub needs_attention: u64,
    /// Passed share of the total, as a percentage.
    pub pass_rate: f64,
}

impl InspectionSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_inspections<'a>(inspections: impl IntoIterator<Item = &'a Inspection>) -> Self {
        let mut summary = Self {
            total_inspections: 0,
            passed_inspections: 0,
            failed_inspections: 0,
            needs_attention: 0,
            pass_rate: 0.0,
        };
        for inspection in inspections {
            summary.total_inspections += 1;
            match inspection.result {
                InspectionResult::Pass => summary.passed_inspections += 1,
                InspectionResult::Fail => summary.failed_inspections += 1,
                InspectionResult::NeedsAttention => summary.needs_attention += 1,
            }
        }
        if summary.total_inspections > 0 {
            summary.pass_rate =
                summary.passed_inspections as f64 / summary.total_inspections as f64 * 100.0;
        }
        summary
    }
}

/// Step-by-step builder for [`Inspection`].
#[derive(Debug, Default)]
pub struct InspectionBuilder {
    id: Option<InspectionId>,
    machine_id: Option<MachineId>,
    inspector_id: Option<UserId>,
    title: Option<String>,
    findings: Option<String>,
    result: Option<InspectionResult>,
    inspection_date: Option<Timestamp>,
}

impl InspectionBuilder {
    #[must_use]
    pub fn id(mut self, id: InspectionId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn machine_id(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    #[must_use]
    pub fn inspector_id(mut self, inspector_id: UserId) -> Self {
        self.inspector_id = Some(inspector_id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn findings(mut self, findings: Option<String>) -> Self {
        self.findings = findings;
        self
    }

    #[must_use]
    pub fn result(mut self, result: InspectionResult) -> Self {
        self.result = Some(result);
        self
    }

    #[must_use]
    pub fn inspection_date(mut self, date: Timestamp) -> Self {
        self.inspection_date = Some(date);
        self
    }

    /// Consume the builder, validate, and return an [`Inspection`].
    ///
    /// `inspection_date` defaults to now.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `machine_id`, `inspector_id`
    /// or `result` is missing, or the title is invalid.
    pub fn build(self) -> Result<Inspection, PmTrackError> {
        let machine_id = self
            .machine_id
            .ok_or(ValidationError::MissingField("machine_id"))?;
        let inspector_id = self
            .inspector_id
            .ok_or(ValidationError::MissingField("inspector_id"))?;
        let result = self.result.ok_or(ValidationError::MissingField("result"))?;
        let created_at = now();
        let inspection = Inspection {
            id: self.id.unwrap_or_default(),
            machine_id,
            inspector_id,
            title: self.title.unwrap_or_default(),
            findings: self.findings,
            result,
            inspection_date: self.inspection_date.unwrap_or(created_at),
            created_at,
            updated_at: created_at,
        };
        inspection.validate()?;
        Ok(inspection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspection(result: InspectionResult) -> Inspection {
        Inspection::builder()
            .machine_id(MachineId::new())
            .inspector_id(UserId::new())
            .title("Monthly check")
            .result(result)
            .build()
            .unwrap()
    }

    #[test]
    fn should_require_result() {
        let result = Inspection::builder()
            .machine_id(MachineId::new())
            .inspector_id(UserId::new())
            .title("Monthly check")
            .build();
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::MissingField("result")))
        ));
    }

    #[test]
    fn should_count_results() {
        let inspections = [
            inspection(InspectionResult::Pass),
            inspection(InspectionResult::Pass),
            inspection(InspectionResult::Fail),
            inspection(InspectionResult::NeedsAttention),
        ];
        let summary = InspectionSummary::from_inspections(&inspections);
        assert_eq!(summary.total_inspections, 4);
        assert_eq!(summary.passed_inspections, 2);
        assert_eq!(summary.failed_inspections, 1);
        assert_eq!(summary.needs_attention, 1);
        assert!((summary.pass_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn should_report_zero_pass_rate_when_empty() {
        let summary = InspectionSummary::from_inspections(&Vec::<Inspection>::new());
        assert_eq!(summary.total_inspections, 0);
        assert!(summary.pass_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn should_serialize_needs_attention() {
        let json = serde_json::to_string(&InspectionResult::NeedsAttention).unwrap();
        assert_eq!(json, "\"NEEDS_ATTENTION\"");
    }

    #[test]
    fn should_filter_by_result() {
        let failed = inspection(InspectionResult::Fail);
        let filter = InspectionFilter {
            result: Some(InspectionResult::Fail),
            ..InspectionFilter::default()
        };
        assert!(filter.matches(&failed));
        assert!(!filter.matches(&inspection(InspectionResult::Pass)));
    }

    #[test]
    fn should_treat_needs_attention_as_failed() {
        let failed = InspectionFilter {
            failed: true,
            ..InspectionFilter::default()
        };
        assert!(failed.matches(&inspection(InspectionResult::Fail)));
        assert!(failed.matches(&inspection(InspectionResult::NeedsAttention)));
        assert!(!failed.matches(&inspection(InspectionResult::Pass)));
    }
}
