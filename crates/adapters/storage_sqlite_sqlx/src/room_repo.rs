//! `SQLite` implementation of [`RoomRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pmtrack_app::ports::RoomRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::{PropertyId, RoomId};
use pmtrack_domain::room::Room;

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::StorageError;

struct Wrapper(Room);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Room> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Room {
            id: parsed(row, "id")?,
            property_id: parsed(row, "property_id")?,
            name: row.try_get("name")?,
            room_number: row.try_get("room_number")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO rooms (id, property_id, name, room_number, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM rooms WHERE id = ?";
const SELECT_BY_PROPERTY: &str = "SELECT * FROM rooms WHERE property_id = ? ORDER BY name";
const SELECT_ALL: &str = "SELECT * FROM rooms ORDER BY name";
const UPDATE: &str =
    "UPDATE rooms SET name = ?, room_number = ?, is_active = ?, updated_at = ? WHERE id = ?";

/// `SQLite`-backed room repository.
#[derive(Clone)]
pub struct SqliteRoomRepository {
    pool: SqlitePool,
}

impl SqliteRoomRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RoomRepository for SqliteRoomRepository {
    fn create(&self, room: Room) -> impl Future<Output = Result<Room, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(room.id.to_string())
                .bind(room.property_id.to_string())
                .bind(&room.name)
                .bind(&room.room_number)
                .bind(room.is_active)
                .bind(encode_timestamp(room.created_at))
                .bind(encode_timestamp(room.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(room)
        }
    }

    fn get_by_id(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<Room>, PmTrackError>> + Send {
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

    fn find_by_property(
        &self,
        property_id: PropertyId,
    ) -> impl Future<Output = Result<Vec<Room>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_PROPERTY)
                .bind(property_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Room>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, room: Room) -> impl Future<Output = Result<Room, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&room.name)
                .bind(&room.room_number)
                .bind(room.is_active)
                .bind(encode_timestamp(room.updated_at))
                .bind(room.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(room)
        }
    }
}
