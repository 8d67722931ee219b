//! `SQLite` implementation of [`PropertyRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pmtrack_app::ports::PropertyRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::PropertyId;
use pmtrack_domain::property::Property;

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::StorageError;

struct Wrapper(Property);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Property> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Property {
            id: parsed(row, "id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO properties (id, name, address, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM properties WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM properties ORDER BY name";
const UPDATE: &str =
    "UPDATE properties SET name = ?, address = ?, is_active = ?, updated_at = ? WHERE id = ?";

/// `SQLite`-backed property repository.
#[derive(Clone)]
pub struct SqlitePropertyRepository {
    pool: SqlitePool,
}

impl SqlitePropertyRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PropertyRepository for SqlitePropertyRepository {
    fn create(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<Property, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(property.id.to_string())
                .bind(&property.name)
                .bind(&property.address)
                .bind(property.is_active)
                .bind(encode_timestamp(property.created_at))
                .bind(encode_timestamp(property.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(property)
        }
    }

    fn get_by_id(
        &self,
        id: PropertyId,
    ) -> impl Future<Output = Result<Option<Property>, PmTrackError>> + Send {
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

    fn get_all(&self) -> impl Future<Output = Result<Vec<Property>, PmTrackError>> + Send {
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
        property: Property,
    ) -> impl Future<Output = Result<Property, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&property.name)
                .bind(&property.address)
                .bind(property.is_active)
                .bind(encode_timestamp(property.updated_at))
                .bind(property.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(property)
        }
    }
}
