//! Facility service: the property → room → machine tree.
//!
//! Rooms are addressed through their property and machines through their
//! room; a child reached through the wrong parent is reported as not found.

use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{NotFoundError, PmTrackError, ValidationError};
use pmtrack_domain::id::{MachineId, PropertyId, RoomId};
use pmtrack_domain::machine::{Machine, MachinePatch};
use pmtrack_domain::property::{Property, PropertyPatch};
use pmtrack_domain::room::{Room, RoomPatch};

use crate::ports::{MachineRepository, PropertyRepository, RoomRepository};

fn property_not_found(id: PropertyId) -> PmTrackError {
    NotFoundError {
        entity: "Property",
        id: id.to_string(),
    }
    .into()
}

fn room_not_found(id: RoomId) -> PmTrackError {
    NotFoundError {
        entity: "Room",
        id: id.to_string(),
    }
    .into()
}

fn machine_not_found(id: MachineId) -> PmTrackError {
    NotFoundError {
        entity: "Machine",
        id: id.to_string(),
    }
    .into()
}

/// Application service for properties, rooms and machines.
pub struct FacilityService<P, R, M> {
    properties: P,
    rooms: R,
    machines: M,
}

impl<P, R, M> FacilityService<P, R, M>
where
    P: PropertyRepository,
    R: RoomRepository,
    M: MachineRepository,
{
    pub fn new(properties: P, rooms: R, machines: M) -> Self {
        Self {
            properties,
            rooms,
            machines,
        }
    }

    // -- properties --

    /// List properties, optionally only those with the given active flag.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ViewRecords`, or a
    /// storage error.
    pub async fn list_properties(
        &self,
        actor: &Actor,
        is_active: Option<bool>,
    ) -> Result<Vec<Property>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let properties = self.properties.get_all().await?;
        Ok(properties
            .into_iter()
            .filter(|property| is_active.is_none_or(|active| property.is_active == active))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown property.
    pub async fn get_property(
        &self,
        actor: &Actor,
        id: PropertyId,
    ) -> Result<Property, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_property(id).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageFacilities`.
    #[tracing::instrument(skip(self, actor, property), fields(actor = %actor.username))]
    pub async fn create_property(
        &self,
        actor: &Actor,
        property: Property,
    ) -> Result<Property, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        property.validate()?;
        self.properties.create(property).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown property and
    /// [`PmTrackError::Validation`] for an invalid patch.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_property(
        &self,
        actor: &Actor,
        id: PropertyId,
        patch: PropertyPatch,
    ) -> Result<Property, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut property = self.find_property(id).await?;
        property.apply(patch)?;
        self.properties.update(property).await
    }

    /// Soft delete a property.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown property.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn delete_property(&self, actor: &Actor, id: PropertyId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut property = self.find_property(id).await?;
        property.deactivate();
        self.properties.update(property).await?;
        Ok(())
    }

    // -- rooms --

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown property.
    pub async fn list_rooms(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        is_active: Option<bool>,
    ) -> Result<Vec<Room>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_property(property_id).await?;
        let rooms = self.rooms.find_by_property(property_id).await?;
        Ok(rooms
            .into_iter()
            .filter(|room| is_active.is_none_or(|active| room.is_active == active))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the room does not exist in
    /// that property.
    pub async fn get_room(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
    ) -> Result<Room, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_room(property_id, room_id).await
    }

    /// Create a room; its `property_id` must name an existing property.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown property.
    #[tracing::instrument(skip(self, actor, room), fields(actor = %actor.username))]
    pub async fn create_room(&self, actor: &Actor, room: Room) -> Result<Room, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        room.validate()?;
        self.find_property(room.property_id).await?;
        self.rooms.create(room).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the room does not exist in
    /// that property.
    pub async fn update_room(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
        patch: RoomPatch,
    ) -> Result<Room, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut room = self.find_room(property_id, room_id).await?;
        room.apply(patch)?;
        self.rooms.update(room).await
    }

    /// Soft delete a room.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the room does not exist in
    /// that property.
    pub async fn delete_room(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
    ) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut room = self.find_room(property_id, room_id).await?;
        room.deactivate();
        self.rooms.update(room).await?;
        Ok(())
    }

    // -- machines --

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the room does not exist in
    /// that property.
    pub async fn list_machines(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
        is_active: Option<bool>,
    ) -> Result<Vec<Machine>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_room(property_id, room_id).await?;
        let machines = self.machines.find_by_room(room_id).await?;
        Ok(machines
            .into_iter()
            .filter(|machine| is_active.is_none_or(|active| machine.is_active == active))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the machine is not in that
    /// room of that property.
    pub async fn get_machine(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
        machine_id: MachineId,
    ) -> Result<Machine, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_machine(property_id, room_id, machine_id).await
    }

    /// Create a machine in a room of a property.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the room does not exist in
    /// that property and [`ValidationError::SerialNumberTaken`] for a
    /// duplicate serial number.
    #[tracing::instrument(skip(self, actor, machine), fields(actor = %actor.username))]
    pub async fn create_machine(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        machine: Machine,
    ) -> Result<Machine, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        machine.validate()?;
        self.find_room(property_id, machine.room_id).await?;
        if let Some(serial) = machine.serial_number.as_deref()
            && self.machines.find_by_serial_number(serial).await?.is_some()
        {
            return Err(ValidationError::SerialNumberTaken.into());
        }
        self.machines.create(machine).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the machine is not in that
    /// room of that property and [`ValidationError::SerialNumberTaken`] when
    /// the new serial number belongs to another machine.
    pub async fn update_machine(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
        machine_id: MachineId,
        patch: MachinePatch,
    ) -> Result<Machine, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut machine = self.find_machine(property_id, room_id, machine_id).await?;
        if let Some(serial) = patch.serial_number.as_deref()
            && let Some(existing) = self.machines.find_by_serial_number(serial).await?
            && existing.id != machine.id
        {
            return Err(ValidationError::SerialNumberTaken.into());
        }
        machine.apply(patch)?;
        self.machines.update(machine).await
    }

    /// Soft delete a machine.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the machine is not in that
    /// room of that property.
    pub async fn delete_machine(
        &self,
        actor: &Actor,
        property_id: PropertyId,
        room_id: RoomId,
        machine_id: MachineId,
    ) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut machine = self.find_machine(property_id, room_id, machine_id).await?;
        machine.deactivate();
        self.machines.update(machine).await?;
        Ok(())
    }

    /// Counts of every facility record, for the admin overview.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ViewStatistics`.
    pub async fn inventory(&self, actor: &Actor) -> Result<FacilityInventory, PmTrackError> {
        actor.authorize(Permission::ViewStatistics)?;
        Ok(FacilityInventory {
            properties: self.properties.get_all().await?,
            rooms: self.rooms.get_all().await?,
            machines: self.machines.get_all().await?,
        })
    }

    async fn find_property(&self, id: PropertyId) -> Result<Property, PmTrackError> {
        self.properties
            .get_by_id(id)
            .await?
            .ok_or_else(|| property_not_found(id))
    }

    async fn find_room(&self, property_id: PropertyId, room_id: RoomId) -> Result<Room, PmTrackError> {
        self.rooms
            .get_by_id(room_id)
            .await?
            .filter(|room| room.property_id == property_id)
            .ok_or_else(|| room_not_found(room_id))
    }

    async fn find_machine(
        &self,
        property_id: PropertyId,
        room_id: RoomId,
        machine_id: MachineId,
    ) -> Result<Machine, PmTrackError> {
        self.find_room(property_id, room_id).await?;
        self.machines
            .get_by_id(machine_id)
            .await?
            .filter(|machine| machine.room_id == room_id)
            .ok_or_else(|| machine_not_found(machine_id))
    }
}

/// Every facility record, active or not.
#[derive(Debug, Clone)]
pub struct FacilityInventory {
    pub properties: Vec<Property>,
    pub rooms: Vec<Room>,
    pub machines: Vec<Machine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemory, actor, user};
    use pmtrack_domain::error::ForbiddenError;
    use pmtrack_domain::user::UserRole;

    type TestFacilities = FacilityService<InMemory<Property>, InMemory<Room>, InMemory<Machine>>;

    fn service() -> TestFacilities {
        FacilityService::new(InMemory::default(), InMemory::default(), InMemory::default())
    }

    fn manager() -> Actor {
        actor(&user("manager", UserRole::Manager))
    }

    async fn seed(service: &TestFacilities) -> (Property, Room) {
        let manager = manager();
        let property = service
            .create_property(&manager, Property::builder().name("HQ").build().unwrap())
            .await
            .unwrap();
        let room = service
            .create_room(
                &manager,
                Room::builder()
                    .property_id(property.id)
                    .name("Plant room")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        (property, room)
    }

    #[tokio::test]
    async fn should_forbid_supervisor_from_creating_property() {
        let service = service();
        let supervisor = actor(&user("sup", UserRole::Supervisor));
        let result = service
            .create_property(&supervisor, Property::builder().name("HQ").build().unwrap())
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Forbidden(ForbiddenError::MissingPermission(
                Permission::ManageFacilities
            )))
        ));
    }

    #[tokio::test]
    async fn should_reject_room_for_unknown_property() {
        let service = service();
        let room = Room::builder()
            .property_id(PropertyId::new())
            .name("Orphan")
            .build()
            .unwrap();
        let result = service.create_room(&manager(), room).await;
        assert!(matches!(result, Err(PmTrackError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_hide_room_reached_through_other_property() {
        let service = service();
        let (_, room) = seed(&service).await;
        let other = service
            .create_property(&manager(), Property::builder().name("Annex").build().unwrap())
            .await
            .unwrap();
        let result = service.get_room(&manager(), other.id, room.id).await;
        assert!(matches!(
            result,
            Err(PmTrackError::NotFound(NotFoundError { entity: "Room", .. }))
        ));
    }

    #[tokio::test]
    async fn should_reject_duplicate_serial_number() {
        let service = service();
        let (property, room) = seed(&service).await;
        let machine = |name: &str| {
            Machine::builder()
                .room_id(room.id)
                .name(name)
                .serial_number(Some("SN-1".to_string()))
                .build()
                .unwrap()
        };
        service
            .create_machine(&manager(), property.id, machine("Pump A"))
            .await
            .unwrap();
        let result = service
            .create_machine(&manager(), property.id, machine("Pump B"))
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::SerialNumberTaken))
        ));
    }

    #[tokio::test]
    async fn should_keep_own_serial_number_on_update() {
        let service = service();
        let (property, room) = seed(&service).await;
        let machine = service
            .create_machine(
                &manager(),
                property.id,
                Machine::builder()
                    .room_id(room.id)
                    .name("Pump")
                    .serial_number(Some("SN-1".to_string()))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        let updated = service
            .update_machine(
                &manager(),
                property.id,
                room.id,
                machine.id,
                MachinePatch {
                    serial_number: Some("SN-1".to_string()),
                    name: Some("Main pump".to_string()),
                    ..MachinePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Main pump");
    }

    #[tokio::test]
    async fn should_soft_delete_and_filter_properties() {
        let service = service();
        let (property, _) = seed(&service).await;
        service
            .delete_property(&manager(), property.id)
            .await
            .unwrap();

        let technician = actor(&user("tech", UserRole::Technician));
        let active = service
            .list_properties(&technician, Some(true))
            .await
            .unwrap();
        assert!(active.is_empty());
        let all = service.list_properties(&technician, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active);
    }

    #[tokio::test]
    async fn should_list_machines_of_room() {
        let service = service();
        let (property, room) = seed(&service).await;
        service
            .create_machine(
                &manager(),
                property.id,
                Machine::builder().room_id(room.id).name("Boiler").build().unwrap(),
            )
            .await
            .unwrap();
        let machines = service
            .list_machines(&manager(), property.id, room.id, None)
            .await
            .unwrap();
        assert_eq!(machines.len(), 1);
    }
}
