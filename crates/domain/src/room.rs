//! Room: a space inside a property that holds machines.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{PropertyId, RoomId};
use crate::time::{Timestamp, now};
use crate::validate;

/// A room of a [`Property`](crate::property::Property).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub property_id: PropertyId,
    pub name: String,
    pub room_number: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Room {
    pub const NAME_MAX: usize = 100;
    pub const NUMBER_MAX: usize = 20;

    /// Create a builder for constructing a [`Room`].
    #[must_use]
    pub fn builder() -> RoomBuilder {
        RoomBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `name` or `room_number`
    /// breaks its length limit.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("name", &self.name, Self::NAME_MAX)?;
        validate::optional("room_number", self.room_number.as_deref(), Self::NUMBER_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: RoomPatch) -> Result<(), PmTrackError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(room_number) = patch.room_number {
            self.room_number = Some(room_number);
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

/// Partial update of a [`Room`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub room_number: Option<String>,
    pub is_active: Option<bool>,
}

/// Step-by-step builder for [`Room`].
#[derive(Debug, Default)]
pub struct RoomBuilder {
    id: Option<RoomId>,
    property_id: Option<PropertyId>,
    name: Option<String>,
    room_number: Option<String>,
    is_active: Option<bool>,
}

impl RoomBuilder {
    #[must_use]
    pub fn id(mut self, id: RoomId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn property_id(mut self, property_id: PropertyId) -> Self {
        self.property_id = Some(property_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn room_number(mut self, room_number: Option<String>) -> Self {
        self.room_number = room_number;
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Consume the builder, validate, and return a [`Room`].
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `property_id` is missing or a
    /// field is invalid.
    pub fn build(self) -> Result<Room, PmTrackError> {
        let property_id = self
            .property_id
            .ok_or(ValidationError::MissingField("property_id"))?;
        let created_at = now();
        let room = Room {
            id: self.id.unwrap_or_default(),
            property_id,
            name: self.name.unwrap_or_default(),
            room_number: self.room_number,
            is_active: self.is_active.unwrap_or(true),
            created_at,
            updated_at: created_at,
        };
        room.validate()?;
        Ok(room)
    }
}
