//! Property: a site (building, campus) that contains rooms.

use serde::{Deserialize, Serialize};

use crate::error::PmTrackError;
use crate::id::PropertyId;
use crate::time::{Timestamp, now};
use crate::validate;

/// A managed site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Property {
    pub const NAME_MAX: usize = 100;

    /// Create a builder for constructing a [`Property`].
    #[must_use]
    pub fn builder() -> PropertyBuilder {
        PropertyBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `name` is empty or too long.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("name", &self.name, Self::NAME_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: PropertyPatch) -> Result<(), PmTrackError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
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

/// Partial update of a [`Property`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Step-by-step builder for [`Property`].
#[derive(Debug, Default)]
pub struct PropertyBuilder {
    id: Option<PropertyId>,
    name: Option<String>,
    address: Option<String>,
    is_active: Option<bool>,
}

impl PropertyBuilder {
    #[must_use]
    pub fn id(mut self, id: PropertyId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: Option<String>) -> Self {
        self.address = address;
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Consume the builder, validate, and return a [`Property`].
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `name` is missing or too long.
    pub fn build(self) -> Result<Property, PmTrackError> {
        let created_at = now();
        let property = Property {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            address: self.address,
            is_active: self.is_active.unwrap_or(true),
            created_at,
            updated_at: created_at,
        };
        property.validate()?;
        Ok(property)
    }
}
