//! `SQLite` implementation of [`MachineRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pmtrack_app::ports::MachineRepository;
use pmtrack_domain::error::{PmTrackError, ValidationError};
use pmtrack_domain::id::{MachineId, RoomId};
use pmtrack_domain::machine::Machine;

use crate::codec::{
    encode_optional_timestamp, encode_timestamp, optional_timestamp, parsed, timestamp,
};
use crate::error::{StorageError, on_unique_violation};

struct Wrapper(Machine);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Machine> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Machine {
            id: parsed(row, "id")?,
            room_id: parsed(row, "room_id")?,
            name: row.try_get("name")?,
            model: row.try_get("model")?,
            serial_number: row.try_get("serial_number")?,
            manufacturer: row.try_get("manufacturer")?,
            machine_type: parsed(row, "machine_type")?,
            status: parsed(row, "status")?,
            description: row.try_get("description")?,
            installation_date: optional_timestamp(row, "installation_date")?,
            warranty_expiry: optional_timestamp(row, "warranty_expiry")?,
            last_maintenance: optional_timestamp(row, "last_maintenance")?,
            next_maintenance: optional_timestamp(row, "next_maintenance")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO machines (id, room_id, name, model, serial_number, manufacturer, machine_type, status, description, installation_date, warranty_expiry, last_maintenance, next_maintenance, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM machines WHERE id = ?";
const SELECT_BY_ROOM: &str = "SELECT * FROM machines WHERE room_id = ? ORDER BY name";
const SELECT_BY_SERIAL_NUMBER: &str = "SELECT * FROM machines WHERE serial_number = ?";
const SELECT_ALL: &str = "SELECT * FROM machines ORDER BY name";
const UPDATE: &str = "UPDATE machines SET room_id = ?, name = ?, model = ?, serial_number = ?, manufacturer = ?, machine_type = ?, status = ?, description = ?, installation_date = ?, warranty_expiry = ?, last_maintenance = ?, next_maintenance = ?, is_active = ?, updated_at = ? WHERE id = ?";

/// `SQLite`-backed machine repository.
#[derive(Clone)]
pub struct SqliteMachineRepository {
    pool: SqlitePool,
}

impl SqliteMachineRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MachineRepository for SqliteMachineRepository {
    fn create(
        &self,
        machine: Machine,
    ) -> impl Future<Output = Result<Machine, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(machine.id.to_string())
                .bind(machine.room_id.to_string())
                .bind(&machine.name)
                .bind(&machine.model)
                .bind(&machine.serial_number)
                .bind(&machine.manufacturer)
                .bind(machine.machine_type.as_str())
                .bind(machine.status.as_str())
                .bind(&machine.description)
                .bind(encode_optional_timestamp(machine.installation_date))
                .bind(encode_optional_timestamp(machine.warranty_expiry))
                .bind(encode_optional_timestamp(machine.last_maintenance))
                .bind(encode_optional_timestamp(machine.next_maintenance))
                .bind(machine.is_active)
                .bind(encode_timestamp(machine.created_at))
                .bind(encode_timestamp(machine.updated_at))
                .execute(&pool)
                .await
                .map_err(|err| {
                    on_unique_violation(err, |_| ValidationError::SerialNumberTaken)
                })?;

            Ok(machine)
        }
    }

    fn get_by_id(
        &self,
        id: MachineId,
    ) -> impl Future<Output = Result<Option<Machine>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Machine>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_ROOM)
                .bind(room_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_serial_number(
        &self,
        serial_number: &str,
    ) -> impl Future<Output = Result<Option<Machine>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        let serial_number = serial_number.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_SERIAL_NUMBER)
                .bind(serial_number)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Machine>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(
        &self,
        machine: Machine,
    ) -> impl Future<Output = Result<Machine, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(machine.room_id.to_string())
                .bind(&machine.name)
                .bind(&machine.model)
                .bind(&machine.serial_number)
                .bind(&machine.manufacturer)
                .bind(machine.machine_type.as_str())
                .bind(machine.status.as_str())
                .bind(&machine.description)
                .bind(encode_optional_timestamp(machine.installation_date))
                .bind(encode_optional_timestamp(machine.warranty_expiry))
                .bind(encode_optional_timestamp(machine.last_maintenance))
                .bind(encode_optional_timestamp(machine.next_maintenance))
                .bind(machine.is_active)
                .bind(encode_timestamp(machine.updated_at))
                .bind(machine.id.to_string())
                .execute(&pool)
                .await
                .map_err(|err| {
                    on_unique_violation(err, |_| ValidationError::SerialNumberTaken)
                })?;

            Ok(machine)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::{TimeZone, Utc};
    use pmtrack_domain::machine::{MachineStatus, MachineType};

    #[tokio::test]
    async fn should_roundtrip_machine_with_dates_and_enums() {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let room = fixtures::room(&pool, &property, "Plant").await;
        let repo = SqliteMachineRepository::new(pool);
        let installed = Utc.with_ymd_and_hms(2021, 5, 1, 8, 0, 0).unwrap();
        let machine = Machine::builder()
            .room_id(room.id)
            .name("Chiller 2")
            .serial_number(Some("CH-002".to_string()))
            .machine_type(MachineType::Hvac)
            .status(MachineStatus::Maintenance)
            .installation_date(Some(installed))
            .build()
            .unwrap();
        let id = machine.id;

        repo.create(machine).await.unwrap();

        let fetched = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.machine_type, MachineType::Hvac);
        assert_eq!(fetched.status, MachineStatus::Maintenance);
        assert_eq!(fetched.installation_date, Some(installed));
        assert!(fetched.warranty_expiry.is_none());
    }

    #[tokio::test]
    async fn should_find_machine_by_serial_number() {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let room = fixtures::room(&pool, &property, "Plant").await;
        let repo = SqliteMachineRepository::new(pool);
        let machine = Machine::builder()
            .room_id(room.id)
            .name("Pump")
            .serial_number(Some("P-1".to_string()))
            .build()
            .unwrap();
        repo.create(machine.clone()).await.unwrap();

        let found = repo.find_by_serial_number("P-1").await.unwrap().unwrap();
        assert_eq!(found.id, machine.id);
        assert!(repo.find_by_serial_number("P-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_report_duplicate_serial_number_as_validation_error() {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let room = fixtures::room(&pool, &property, "Plant").await;
        let repo = SqliteMachineRepository::new(pool);
        let with_serial = |name: &str| {
            Machine::builder()
                .room_id(room.id)
                .name(name)
                .serial_number(Some("SN-7".to_string()))
                .build()
                .unwrap()
        };
        repo.create(with_serial("Pump A")).await.unwrap();

        let result = repo.create(with_serial("Pump B")).await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::SerialNumberTaken))
        ));
    }

    #[tokio::test]
    async fn should_allow_many_machines_without_serial_number() {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let room = fixtures::room(&pool, &property, "Plant").await;
        fixtures::machine(&pool, &room, "Fan A").await;
        fixtures::machine(&pool, &room, "Fan B").await;
        let repo = SqliteMachineRepository::new(pool);

        let names: Vec<String> = repo
            .find_by_room(room.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Fan A", "Fan B"]);
    }

    #[tokio::test]
    async fn should_update_machine_status() {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let room = fixtures::room(&pool, &property, "Plant").await;
        let mut machine = fixtures::machine(&pool, &room, "Boiler").await;
        let repo = SqliteMachineRepository::new(pool);

        machine.status = MachineStatus::OutOfService;
        repo.update(machine.clone()).await.unwrap();

        let fetched = repo.get_by_id(machine.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, MachineStatus::OutOfService);
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }
}
