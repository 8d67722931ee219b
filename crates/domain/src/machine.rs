//! Machine: a piece of equipment installed in a room.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{MachineId, RoomId};
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Trade a machine belongs to.
    #[derive(Default)]
    MachineType {
        Hvac => "HVAC",
        Electrical => "ELECTRICAL",
        Plumbing => "PLUMBING",
        Mechanical => "MECHANICAL",
        Electronic => "ELECTRONIC",
        Furniture => "FURNITURE",
        Security => "SECURITY",
        #[default]
        Other => "OTHER",
    }
}

string_enum! {
    /// Operating condition of a machine.
    #[derive(Default)]
    MachineStatus {
        #[default]
        Operational => "OPERATIONAL",
        Maintenance => "MAINTENANCE",
        OutOfService => "OUT_OF_SERVICE",
        Retired => "RETIRED",
    }
}

/// A piece of equipment that receives work orders and inspections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub room_id: RoomId,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub machine_type: MachineType,
    pub status: MachineStatus,
    pub description: Option<String>,
    pub installation_date: Option<Timestamp>,
    pub warranty_expiry: Option<Timestamp>,
    pub last_maintenance: Option<Timestamp>,
    pub next_maintenance: Option<Timestamp>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Machine {
    pub const NAME_MAX: usize = 100;
    pub const FIELD_MAX: usize = 100;

    /// Create a builder for constructing a [`Machine`].
    #[must_use]
    pub fn builder() -> MachineBuilder {
        MachineBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when a text field is empty or
    /// too long.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("name", &self.name, Self::NAME_MAX)?;
        validate::optional("model", self.model.as_deref(), Self::FIELD_MAX)?;
        validate::optional("serial_number", self.serial_number.as_deref(), Self::FIELD_MAX)?;
        validate::optional("manufacturer", self.manufacturer.as_deref(), Self::FIELD_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: MachinePatch) -> Result<(), PmTrackError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(model) = patch.model {
            self.model = Some(model);
        }
        if let Some(serial_number) = patch.serial_number {
            self.serial_number = Some(serial_number);
        }
        if let Some(manufacturer) = patch.manufacturer {
            self.manufacturer = Some(manufacturer);
        }
        if let Some(machine_type) = patch.machine_type {
            self.machine_type = machine_type;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(date) = patch.installation_date {
            self.installation_date = Some(date);
        }
        if let Some(date) = patch.warranty_expiry {
            self.warranty_expiry = Some(date);
        }
        if let Some(date) = patch.last_maintenance {
            self.last_maintenance = Some(date);
        }
        if let Some(date) = patch.next_maintenance {
            self.next_maintenance = Some(date);
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

/// Partial update of a [`Machine`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachinePatch {
    pub name: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub machine_type: Option<MachineType>,
    pub status: Option<MachineStatus>,
    pub description: Option<String>,
    pub installation_date: Option<Timestamp>,
    pub warranty_expiry: Option<Timestamp>,
    pub last_maintenance: Option<Timestamp>,
    pub next_maintenance: Option<Timestamp>,
    pub is_active: Option<bool>,
}

/// Step-by-step builder for [`Machine`].
#[derive(Debug, Default)]
pub struct MachineBuilder {
    id: Option<MachineId>,
    room_id: Option<RoomId>,
    name: Option<String>,
    model: Option<String>,
    serial_number: Option<String>,
    manufacturer: Option<String>,
    machine_type: Option<MachineType>,
    status: Option<MachineStatus>,
    description: Option<String>,
    installation_date: Option<Timestamp>,
    warranty_expiry: Option<Timestamp>,
    last_maintenance: Option<Timestamp>,
    next_maintenance: Option<Timestamp>,
}

impl MachineBuilder {
    #[must_use]
    pub fn id(mut self, id: MachineId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn serial_number(mut self, serial_number: Option<String>) -> Self {
        self.serial_number = serial_number;
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: Option<String>) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    #[must_use]
    pub fn machine_type(mut self, machine_type: MachineType) -> Self {
        self.machine_type = Some(machine_type);
        self
    }

    #[must_use]
    pub fn status(mut self, status: MachineStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn installation_date(mut self, date: Option<Timestamp>) -> Self {
        self.installation_date = date;
        self
    }

    #[must_use]
    pub fn warranty_expiry(mut self, date: Option<Timestamp>) -> Self {
        self.warranty_expiry = date;
        self
    }

    #[must_use]
    pub fn last_maintenance(mut self, date: Option<Timestamp>) -> Self {
        self.last_maintenance = date;
        self
    }

    #[must_use]
    pub fn next_maintenance(mut self, date: Option<Timestamp>) -> Self {
        self.next_maintenance = date;
        self
    }

    /// Consume the builder, validate, and return a [`Machine`].
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `room_id` is missing or a
    /// field is invalid.
    pub fn build(self) -> Result<Machine, PmTrackError> {
        let room_id = self.room_id.ok_or(ValidationError::MissingField("room_id"))?;
        let created_at = now();
        let machine = Machine {
            id: self.id.unwrap_or_default(),
            room_id,
            name: self.name.unwrap_or_default(),
            model: self.model,
            serial_number: self.serial_number,
            manufacturer: self.manufacturer,
            machine_type: self.machine_type.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            description: self.description,
            installation_date: self.installation_date,
            warranty_expiry: self.warranty_expiry,
            last_maintenance: self.last_maintenance,
            next_maintenance: self.next_maintenance,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        machine.validate()?;
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_operational_other_machine() {
        let machine = Machine::builder()
            .room_id(RoomId::new())
            .name("Air handler")
            .build()
            .unwrap();
        assert_eq!(machine.machine_type, MachineType::Other);
        assert_eq!(machine.status, MachineStatus::Operational);
        assert!(machine.is_active);
    }

    #[test]
    fn should_serialize_status_in_screaming_snake_case() {
        let json = serde_json::to_string(&MachineStatus::OutOfService).unwrap();
        assert_eq!(json, "\"OUT_OF_SERVICE\"");
        assert_eq!("HVAC".parse::<MachineType>().unwrap(), MachineType::Hvac);
    }

    #[test]
    fn should_apply_status_patch() {
        let mut machine = Machine::builder()
            .room_id(RoomId::new())
            .name("Chiller")
            .build()
            .unwrap();
        machine
            .apply(MachinePatch {
                status: Some(MachineStatus::Maintenance),
                ..MachinePatch::default()
            })
            .unwrap();
        assert_eq!(machine.status, MachineStatus::Maintenance);
    }
}
