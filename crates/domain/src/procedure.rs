//! Procedure: the written steps for one kind of maintenance, filed under a topic.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{ProcedureId, TopicId};
use crate::time::{Timestamp, now};
use crate::validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub id: ProcedureId,
    pub topic_id: TopicId,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Procedure {
    pub const TITLE_MAX: usize = 100;

    /// Create a builder for constructing a [`Procedure`].
    #[must_use]
    pub fn builder() -> ProcedureBuilder {
        ProcedureBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the title is empty or too
    /// long, or the estimate is below one minute.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("title", &self.title, Self::TITLE_MAX)?;
        validate::positive("estimated_minutes", self.estimated_minutes)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: ProcedurePatch) -> Result<(), PmTrackError> {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(instructions) = patch.instructions {
            self.instructions = Some(instructions);
        }
        if let Some(minutes) = patch.estimated_minutes {
            self.estimated_minutes = Some(minutes);
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

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcedurePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub is_active: Option<bool>,
}

/// Criteria for listing procedures. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureFilter {
    pub topic_id: Option<TopicId>,
    pub is_active: Option<bool>,
}

impl ProcedureFilter {
    #[must_use]
    pub fn matches(&self, procedure: &Procedure) -> bool {
        self.topic_id.is_none_or(|id| procedure.topic_id == id)
            && self
                .is_active
                .is_none_or(|active| procedure.is_active == active)
    }
}

/// Step-by-step builder for [`Procedure`].
#[derive(Debug, Default)]
pub struct ProcedureBuilder {
    topic_id: Option<TopicId>,
    title: Option<String>,
    description: Option<String>,
    instructions: Option<String>,
    estimated_minutes: Option<i64>,
}

impl ProcedureBuilder {
    #[must_use]
    pub fn topic_id(mut self, topic_id: TopicId) -> Self {
        self.topic_id = Some(topic_id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }

    #[must_use]
    pub fn estimated_minutes(mut self, minutes: Option<i64>) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    /// Consume the builder, validate, and return an active [`Procedure`].
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `topic_id` is missing or a
    /// field is invalid.
    pub fn build(self) -> Result<Procedure, PmTrackError> {
        let topic_id = self
            .topic_id
            .ok_or(ValidationError::MissingField("topic_id"))?;
        let created_at = now();
        let procedure = Procedure {
            id: ProcedureId::new(),
            topic_id,
            title: self.title.unwrap_or_default(),
            description: self.description,
            instructions: self.instructions,
            estimated_minutes: self.estimated_minutes,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        procedure.validate()?;
        Ok(procedure)
    }
}
