//! `SQLite` implementation of [`InspectionRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::InspectionRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::InspectionId;
use pmtrack_domain::inspection::{Inspection, InspectionFilter, InspectionResult};

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::StorageError;

struct Wrapper(Inspection);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Inspection> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Inspection {
            id: parsed(row, "id")?,
            machine_id: parsed(row, "machine_id")?,
            inspector_id: parsed(row, "inspector_id")?,
            title: row.try_get("title")?,
            findings: row.try_get("findings")?,
            result: parsed(row, "result")?,
            inspection_date: timestamp(row, "inspection_date")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO inspections (id, machine_id, inspector_id, title, findings, result, inspection_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM inspections WHERE id = ?";
const UPDATE: &str = "UPDATE inspections SET title = ?, findings = ?, result = ?, inspection_date = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM inspections WHERE id = ?";

fn list_query(filter: &InspectionFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM inspections WHERE 1 = 1");
    if let Some(machine_id) = filter.machine_id {
        query
            .push(" AND machine_id = ")
            .push_bind(machine_id.to_string());
    }
    if let Some(inspector_id) = filter.inspector_id {
        query
            .push(" AND inspector_id = ")
            .push_bind(inspector_id.to_string());
    }
    if let Some(result) = filter.result {
        query.push(" AND result = ").push_bind(result.as_str());
    }
    if filter.failed {
        query
            .push(" AND result != ")
            .push_bind(InspectionResult::Pass.as_str());
    }
    query.push(" ORDER BY inspection_date DESC, rowid DESC");
    query
}

/// `SQLite`-backed inspection repository.
#[derive(Clone)]
pub struct SqliteInspectionRepository {
    pool: SqlitePool,
}

impl SqliteInspectionRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl InspectionRepository for SqliteInspectionRepository {
    fn create(
        &self,
        inspection: Inspection,
    ) -> impl Future<Output = Result<Inspection, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(inspection.id.to_string())
                .bind(inspection.machine_id.to_string())
                .bind(inspection.inspector_id.to_string())
                .bind(&inspection.title)
                .bind(&inspection.findings)
                .bind(inspection.result.as_str())
                .bind(encode_timestamp(inspection.inspection_date))
                .bind(encode_timestamp(inspection.created_at))
                .bind(encode_timestamp(inspection.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(inspection)
        }
    }

    fn get_by_id(
        &self,
        id: InspectionId,
    ) -> impl Future<Output = Result<Option<Inspection>, PmTrackError>> + Send {
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

    fn list(
        &self,
        filter: &InspectionFilter,
    ) -> impl Future<Output = Result<Vec<Inspection>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        let mut query = list_query(filter);
        async move {
            let rows: Vec<Wrapper> = query
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(
        &self,
        inspection: Inspection,
    ) -> impl Future<Output = Result<Inspection, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&inspection.title)
                .bind(&inspection.findings)
                .bind(inspection.result.as_str())
                .bind(encode_timestamp(inspection.inspection_date))
                .bind(encode_timestamp(inspection.updated_at))
                .bind(inspection.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(inspection)
        }
    }

    fn delete(&self, id: InspectionId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
