//! Topic: a maintenance category that jobs can be filed under.

use serde::{Deserialize, Serialize};

use crate::error::PmTrackError;
use crate::id::TopicId;
use crate::time::{Timestamp, now};
use crate::validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Topic {
    pub const TITLE_MAX: usize = 100;

    /// Create an active topic.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `title` is empty or too long.
    pub fn new(title: impl Into<String>, description: Option<String>) -> Result<Self, PmTrackError> {
        let created_at = now();
        let topic = Self {
            id: TopicId::new(),
            title: title.into(),
            description,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        topic.validate()?;
        Ok(topic)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `title` is empty or too long.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("title", &self.title, Self::TITLE_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: TopicPatch) -> Result<(), PmTrackError> {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
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
pub struct TopicPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
