//! `SQLite` implementation of [`ProcedureRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::ProcedureRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::ProcedureId;
use pmtrack_domain::procedure::{Procedure, ProcedureFilter};

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::StorageError;

struct Wrapper(Procedure);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Procedure {
            id: parsed(row, "id")?,
            topic_id: parsed(row, "topic_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            instructions: row.try_get("instructions")?,
            estimated_minutes: row.try_get("estimated_minutes")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO procedures (id, topic_id, title, description, instructions, estimated_minutes, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM procedures WHERE id = ?";
const UPDATE: &str = "UPDATE procedures SET title = ?, description = ?, instructions = ?, estimated_minutes = ?, is_active = ?, updated_at = ? WHERE id = ?";

fn list_query(filter: &ProcedureFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM procedures WHERE 1 = 1");
    if let Some(topic_id) = filter.topic_id {
        query.push(" AND topic_id = ").push_bind(topic_id.to_string());
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    query.push(" ORDER BY title, rowid");
    query
}

/// `SQLite`-backed procedure repository.
#[derive(Clone)]
pub struct SqliteProcedureRepository {
    pool: SqlitePool,
}

impl SqliteProcedureRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ProcedureRepository for SqliteProcedureRepository {
    fn create(
        &self,
        procedure: Procedure,
    ) -> impl Future<Output = Result<Procedure, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(procedure.id.to_string())
                .bind(procedure.topic_id.to_string())
                .bind(&procedure.title)
                .bind(&procedure.description)
                .bind(&procedure.instructions)
                .bind(procedure.estimated_minutes)
                .bind(procedure.is_active)
                .bind(encode_timestamp(procedure.created_at))
                .bind(encode_timestamp(procedure.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(procedure)
        }
    }

    fn get_by_id(
        &self,
        id: ProcedureId,
    ) -> impl Future<Output = Result<Option<Procedure>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn list(
        &self,
        filter: &ProcedureFilter,
    ) -> impl Future<Output = Result<Vec<Procedure>, PmTrackError>> + Send {
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
        procedure: Procedure,
    ) -> impl Future<Output = Result<Procedure, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&procedure.title)
                .bind(&procedure.description)
                .bind(&procedure.instructions)
                .bind(procedure.estimated_minutes)
                .bind(procedure.is_active)
                .bind(encode_timestamp(procedure.updated_at))
                .bind(procedure.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(procedure)
        }
    }
}
