//! Preventive maintenance: recurring schedules and their executions.
//!
//! A [`PmSchedule`] binds a [`Procedure`](crate::procedure::Procedure) to a
//! machine and a responsible user, and carries the date the work is next due.
//! Each time a [`PmExecution`] of the schedule is completed, the next due date
//! is recomputed from the completion time and the schedule's frequency.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{MachineId, PmExecutionId, PmScheduleId, ProcedureId, UserId};
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Unit of a schedule's recurrence.
    FrequencyType {
        Daily => "DAILY",
        Weekly => "WEEKLY",
        Monthly => "MONTHLY",
        Quarterly => "QUARTERLY",
        Annual => "ANNUAL",
    }
}

impl FrequencyType {
    /// Length of one period in days. Months are 30 days, quarters 90 and
    /// years 365.
    #[must_use]
    pub fn days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Annual => 365,
        }
    }

    /// The date `every` periods after `from`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DueDateOutOfRange`] when the result cannot
    /// be represented.
    pub fn next_due(self, from: Timestamp, every: i64) -> Result<Timestamp, ValidationError> {
        self.days()
            .checked_mul(every)
            .and_then(Duration::try_days)
            .and_then(|period| from.checked_add_signed(period))
            .ok_or(ValidationError::DueDateOutOfRange)
    }
}

string_enum! {
    /// Progress of a [`PmExecution`].
    #[derive(Default)]
    PmStatus {
        #[default]
        Scheduled => "SCHEDULED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Overdue => "OVERDUE",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmSchedule {
    pub id: PmScheduleId,
    pub machine_id: MachineId,
    pub procedure_id: ProcedureId,
    /// Responsible technician.
    pub user_id: UserId,
    pub frequency: FrequencyType,
    /// Number of `frequency` periods between two executions.
    pub frequency_value: i64,
    pub last_completed: Option<Timestamp>,
    pub next_due: Timestamp,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PmSchedule {
    pub const FREQUENCY_VALUE_MAX: i64 = 1000;

    /// Create a builder for constructing a [`PmSchedule`].
    #[must_use]
    pub fn builder() -> PmScheduleBuilder {
        PmScheduleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `frequency_value` is outside
    /// `1..=1000`.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::within(
            "frequency_value",
            self.frequency_value,
            1,
            Self::FREQUENCY_VALUE_MAX,
        )?;
        Ok(())
    }

    /// Active and due strictly before `at`.
    #[must_use]
    pub fn is_overdue(&self, at: Timestamp) -> bool {
        self.is_active && self.next_due < at
    }

    /// Record a completed execution at `at` and move `next_due` one
    /// recurrence past it. Returns the new due date.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DueDateOutOfRange`] when the next due date
    /// cannot be represented; the schedule is left unchanged.
    pub fn record_completion(&mut self, at: Timestamp) -> Result<Timestamp, PmTrackError> {
        let next_due = self.frequency.next_due(at, self.frequency_value)?;
        self.last_completed = Some(at);
        self.next_due = next_due;
        self.updated_at = now();
        Ok(next_due)
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: PmSchedulePatch) -> Result<(), PmTrackError> {
        if let Some(machine_id) = patch.machine_id {
            self.machine_id = machine_id;
        }
        if let Some(procedure_id) = patch.procedure_id {
            self.procedure_id = procedure_id;
        }
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = frequency;
        }
        if let Some(value) = patch.frequency_value {
            self.frequency_value = value;
        }
        if let Some(at) = patch.last_completed {
            self.last_completed = Some(at);
        }
        if let Some(at) = patch.next_due {
            self.next_due = at;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now();
        self.validate()
    }

    /// Soft delete.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = now();
    }
}

/// Partial update of a [`PmSchedule`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PmSchedulePatch {
    pub machine_id: Option<MachineId>,
    pub procedure_id: Option<ProcedureId>,
    pub user_id: Option<UserId>,
    pub frequency: Option<FrequencyType>,
    pub frequency_value: Option<i64>,
    pub last_completed: Option<Timestamp>,
    pub next_due: Option<Timestamp>,
    pub is_active: Option<bool>,
}

/// Criteria for listing schedules. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PmScheduleFilter {
    pub machine_id: Option<MachineId>,
    pub procedure_id: Option<ProcedureId>,
    pub user_id: Option<UserId>,
    pub frequency: Option<FrequencyType>,
    pub is_active: Option<bool>,
    /// `next_due < due_before`.
    pub due_before: Option<Timestamp>,
    /// `next_due >= due_from`.
    pub due_from: Option<Timestamp>,
    /// `next_due <= due_until`.
    pub due_until: Option<Timestamp>,
}

impl PmScheduleFilter {
    /// Active schedules whose due date has passed.
    #[must_use]
    pub fn overdue(at: Timestamp) -> Self {
        Self {
            is_active: Some(true),
            due_before: Some(at),
            ..Self::default()
        }
    }

    /// Active schedules due between `from` and `until`, both inclusive.
    #[must_use]
    pub fn upcoming(from: Timestamp, until: Timestamp) -> Self {
        Self {
            is_active: Some(true),
            due_from: Some(from),
            due_until: Some(until),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, schedule: &PmSchedule) -> bool {
        self.machine_id.is_none_or(|id| schedule.machine_id == id)
            && self.procedure_id.is_none_or(|id| schedule.procedure_id == id)
            && self.user_id.is_none_or(|id| schedule.user_id == id)
            && self
                .frequency
                .is_none_or(|frequency| schedule.frequency == frequency)
            && self
                .is_active
                .is_none_or(|active| schedule.is_active == active)
            && self.due_before.is_none_or(|at| schedule.next_due < at)
            && self.due_from.is_none_or(|at| schedule.next_due >= at)
            && self.due_until.is_none_or(|at| schedule.next_due <= at)
    }
}

/// One run of a [`PmSchedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmExecution {
    pub id: PmExecutionId,
    pub pm_schedule_id: PmScheduleId,
    pub executed_by_id: UserId,
    pub status: PmStatus,
    pub notes: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    /// The schedule's due date computed when this run completed.
    pub next_due_calculated: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PmExecution {
    /// Start tracking a run of `schedule_id` by `executed_by_id`.
    #[must_use]
    pub fn new(
        pm_schedule_id: PmScheduleId,
        executed_by_id: UserId,
        status: PmStatus,
        notes: Option<String>,
    ) -> Self {
        let created_at = now();
        let mut execution = Self {
            id: PmExecutionId::new(),
            pm_schedule_id,
            executed_by_id,
            status: PmStatus::Scheduled,
            notes,
            started_at: None,
            completed_at: None,
            next_due_calculated: None,
            created_at,
            updated_at: created_at,
        };
        execution.set_status(status, created_at);
        execution
    }

    /// Change the status. `IN_PROGRESS` stamps `started_at` the first time;
    /// entering `COMPLETED` stamps `completed_at`.
    pub fn set_status(&mut self, status: PmStatus, at: Timestamp) {
        match status {
            PmStatus::InProgress => {
                self.started_at.get_or_insert(at);
            }
            PmStatus::Completed if self.status != PmStatus::Completed => {
                self.completed_at = Some(at);
            }
            _ => {}
        }
        self.status = status;
        self.updated_at = at;
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == PmStatus::Completed
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: PmExecutionPatch) {
        let at = now();
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(status) = patch.status {
            self.set_status(status, at);
        }
        self.updated_at = at;
    }
}

/// Partial update of a [`PmExecution`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PmExecutionPatch {
    pub status: Option<PmStatus>,
    pub notes: Option<String>,
    pub started_at: Option<Timestamp>,
}

/// Criteria for listing executions. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PmExecutionFilter {
    pub pm_schedule_id: Option<PmScheduleId>,
    pub executed_by_id: Option<UserId>,
    pub status: Option<PmStatus>,
}

impl PmExecutionFilter {
    #[must_use]
    pub fn matches(&self, execution: &PmExecution) -> bool {
        self.pm_schedule_id
            .is_none_or(|id| execution.pm_schedule_id == id)
            && self
                .executed_by_id
                .is_none_or(|id| execution.executed_by_id == id)
            && self.status.is_none_or(|status| execution.status == status)
    }
}

/// Counters over every schedule and execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PmSummary {
    pub total_schedules: u64,
    pub overdue_schedules: u64,
    pub total_executions: u64,
    pub completed_executions: u64,
}

impl PmSummary {
    #[must_use]
    pub fn from_records(
        schedules: &[PmSchedule],
        executions: &[PmExecution],
        at: Timestamp,
    ) -> Self {
        Self {
            total_schedules: schedules.len() as u64,
            overdue_schedules: schedules.iter().filter(|s| s.is_overdue(at)).count() as u64,
            total_executions: executions.len() as u64,
            completed_executions: executions.iter().filter(|e| e.is_completed()).count() as u64,
        }
    }
}

/// Step-by-step builder for [`PmSchedule`].
#[derive(Debug, Default)]
pub struct PmScheduleBuilder {
    machine_id: Option<MachineId>,
    procedure_id: Option<ProcedureId>,
    user_id: Option<UserId>,
    frequency: Option<FrequencyType>,
    frequency_value: Option<i64>,
    last_completed: Option<Timestamp>,
    next_due: Option<Timestamp>,
}

impl PmScheduleBuilder {
    #[must_use]
    pub fn machine_id(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    #[must_use]
    pub fn procedure_id(mut self, procedure_id: ProcedureId) -> Self {
        self.procedure_id = Some(procedure_id);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: FrequencyType) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn frequency_value(mut self, value: i64) -> Self {
        self.frequency_value = Some(value);
        self
    }

    #[must_use]
    pub fn last_completed(mut self, at: Option<Timestamp>) -> Self {
        self.last_completed = at;
        self
    }

    #[must_use]
    pub fn next_due(mut self, at: Option<Timestamp>) -> Self {
        self.next_due = at;
        self
    }

    /// Consume the builder, validate, and return an active [`PmSchedule`].
    ///
    /// `frequency_value` defaults to 1. Without an explicit `next_due` the
    /// first run is due one recurrence after the last completion, or after
    /// now when the schedule has never run.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if a reference or the frequency
    /// is missing, or a field is invalid.
    pub fn build(self) -> Result<PmSchedule, PmTrackError> {
        let machine_id = self
            .machine_id
            .ok_or(ValidationError::MissingField("machine_id"))?;
        let procedure_id = self
            .procedure_id
            .ok_or(ValidationError::MissingField("procedure_id"))?;
        let user_id = self
            .user_id
            .ok_or(ValidationError::MissingField("user_id"))?;
        let frequency = self
            .frequency
            .ok_or(ValidationError::MissingField("frequency"))?;
        let created_at = now();
        let mut schedule = PmSchedule {
            id: PmScheduleId::new(),
            machine_id,
            procedure_id,
            user_id,
            frequency,
            frequency_value: self.frequency_value.unwrap_or(1),
            last_completed: self.last_completed,
            next_due: created_at,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        schedule.validate()?;
        schedule.next_due = match self.next_due {
            Some(at) => at,
            None => frequency.next_due(
                self.last_completed.unwrap_or(created_at),
                schedule.frequency_value,
            )?,
        };
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn schedule(frequency: FrequencyType, every: i64) -> PmSchedule {
        PmSchedule::builder()
            .machine_id(MachineId::new())
            .procedure_id(ProcedureId::new())
            .user_id(UserId::new())
            .frequency(frequency)
            .frequency_value(every)
            .build()
            .unwrap()
    }

    #[test]
    fn should_compute_next_due_per_frequency() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let cases = [
            (FrequencyType::Daily, 3, Utc.with_ymd_and_hms(2024, 1, 4, 9, 0, 0)),
            (FrequencyType::Weekly, 2, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0)),
            (FrequencyType::Monthly, 1, Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0)),
            (FrequencyType::Quarterly, 1, Utc.with_ymd_and_hms(2024, 3, 31, 9, 0, 0)),
            (FrequencyType::Annual, 1, Utc.with_ymd_and_hms(2024, 12, 31, 9, 0, 0)),
        ];
        for (frequency, every, expected) in cases {
            assert_eq!(frequency.next_due(from, every).unwrap(), expected.unwrap());
        }
    }

    #[test]
    fn should_report_unrepresentable_due_date() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FrequencyType::Annual.next_due(from, i64::MAX),
            Err(ValidationError::DueDateOutOfRange)
        );
        assert_eq!(
            FrequencyType::Daily.next_due(Timestamp::MAX_UTC, 1),
            Err(ValidationError::DueDateOutOfRange)
        );
    }

    #[test]
    fn should_default_first_due_date_to_one_recurrence_from_now() {
        let before = now();
        let schedule = schedule(FrequencyType::Weekly, 1);
        assert_eq!(schedule.frequency_value, 1);
        assert!(schedule.next_due >= before + Duration::days(7));
        assert!(schedule.next_due <= now() + Duration::days(7));
    }

    #[test]
    fn should_reject_frequency_value_outside_bounds() {
        for every in [0, -1, PmSchedule::FREQUENCY_VALUE_MAX + 1] {
            let result = PmSchedule::builder()
                .machine_id(MachineId::new())
                .procedure_id(ProcedureId::new())
                .user_id(UserId::new())
                .frequency(FrequencyType::Daily)
                .frequency_value(every)
                .build();
            assert!(matches!(
                result,
                Err(PmTrackError::Validation(ValidationError::OutOfRange {
                    field: "frequency_value",
                    ..
                }))
            ));
        }
    }

    #[test]
    fn should_advance_due_date_from_completion_time() {
        let mut schedule = schedule(FrequencyType::Monthly, 2);
        let done = Utc.with_ymd_and_hms(2024, 5, 10, 14, 0, 0).unwrap();
        let next = schedule.record_completion(done).unwrap();
        assert_eq!(next, done + Duration::days(60));
        assert_eq!(schedule.next_due, next);
        assert_eq!(schedule.last_completed, Some(done));
    }

    #[test]
    fn should_keep_schedule_when_completion_overflows() {
        let mut schedule = schedule(FrequencyType::Annual, 1);
        let due = schedule.next_due;
        assert!(schedule.record_completion(Timestamp::MAX_UTC).is_err());
        assert_eq!(schedule.next_due, due);
        assert!(schedule.last_completed.is_none());
    }

    #[test]
    fn should_treat_only_active_past_due_schedules_as_overdue() {
        let mut schedule = schedule(FrequencyType::Daily, 1);
        let later = schedule.next_due + Duration::seconds(1);
        assert!(schedule.is_overdue(later));
        assert!(!schedule.is_overdue(schedule.next_due));
        assert!(PmScheduleFilter::overdue(later).matches(&schedule));
        schedule.deactivate();
        assert!(!schedule.is_overdue(later));
        assert!(!PmScheduleFilter::overdue(later).matches(&schedule));
    }

    #[test]
    fn should_match_upcoming_window_inclusively() {
        let schedule = schedule(FrequencyType::Daily, 1);
        let due = schedule.next_due;
        assert!(PmScheduleFilter::upcoming(due, due).matches(&schedule));
        assert!(
            !PmScheduleFilter::upcoming(due + Duration::seconds(1), due + Duration::days(7))
                .matches(&schedule)
        );
    }

    #[test]
    fn should_stamp_execution_times_once() {
        let mut execution =
            PmExecution::new(PmScheduleId::new(), UserId::new(), PmStatus::InProgress, None);
        let started = execution.started_at.unwrap();
        let later = started + Duration::hours(1);
        execution.set_status(PmStatus::InProgress, later);
        assert_eq!(execution.started_at, Some(started));

        execution.set_status(PmStatus::Completed, later);
        execution.set_status(PmStatus::Completed, later + Duration::hours(1));
        assert_eq!(execution.completed_at, Some(later));
        assert!(execution.is_completed());
    }

    #[test]
    fn should_summarize_schedules_and_executions() {
        let overdue = schedule(FrequencyType::Daily, 1);
        let at = overdue.next_due + Duration::days(1);
        let future = PmSchedule::builder()
            .machine_id(MachineId::new())
            .procedure_id(ProcedureId::new())
            .user_id(UserId::new())
            .frequency(FrequencyType::Annual)
            .next_due(Some(at + Duration::days(10)))
            .build()
            .unwrap();
        let done = PmExecution::new(overdue.id, UserId::new(), PmStatus::Completed, None);
        let open = PmExecution::new(overdue.id, UserId::new(), PmStatus::Scheduled, None);

        let summary = PmSummary::from_records(&[overdue, future], &[done, open], at);
        assert_eq!(
            summary,
            PmSummary {
                total_schedules: 2,
                overdue_schedules: 1,
                total_executions: 2,
                completed_executions: 1,
            }
        );
    }
}
