//! `SQLite` implementation of [`PmExecutionRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::PmExecutionRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::PmExecutionId;
use pmtrack_domain::pm_schedule::{PmExecution, PmExecutionFilter, PmSchedule};

use crate::codec::{
    encode_optional_timestamp, encode_timestamp, optional_timestamp, parsed, timestamp,
};
use crate::error::StorageError;
use crate::pm_schedule_repo::update_query as update_schedule;

struct Wrapper(PmExecution);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(PmExecution {
            id: parsed(row, "id")?,
            pm_schedule_id: parsed(row, "pm_schedule_id")?,
            executed_by_id: parsed(row, "executed_by_id")?,
            status: parsed(row, "status")?,
            notes: row.try_get("notes")?,
            started_at: optional_timestamp(row, "started_at")?,
            completed_at: optional_timestamp(row, "completed_at")?,
            next_due_calculated: optional_timestamp(row, "next_due_calculated")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO pm_executions (id, pm_schedule_id, executed_by_id, status, notes, started_at, completed_at, next_due_calculated, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const UPSERT: &str = "INSERT INTO pm_executions (id, pm_schedule_id, executed_by_id, status, notes, started_at, completed_at, next_due_calculated, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
    ON CONFLICT (id) DO UPDATE SET status = excluded.status, notes = excluded.notes, started_at = excluded.started_at, completed_at = excluded.completed_at, next_due_calculated = excluded.next_due_calculated, updated_at = excluded.updated_at";
const SELECT_BY_ID: &str = "SELECT * FROM pm_executions WHERE id = ?";
const UPDATE: &str = "UPDATE pm_executions SET status = ?, notes = ?, started_at = ?, completed_at = ?, next_due_calculated = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM pm_executions WHERE id = ?";

fn list_query(filter: &PmExecutionFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM pm_executions WHERE 1 = 1");
    if let Some(pm_schedule_id) = filter.pm_schedule_id {
        query
            .push(" AND pm_schedule_id = ")
            .push_bind(pm_schedule_id.to_string());
    }
    if let Some(executed_by_id) = filter.executed_by_id {
        query
            .push(" AND executed_by_id = ")
            .push_bind(executed_by_id.to_string());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    query.push(" ORDER BY created_at DESC, rowid DESC");
    query
}

fn insert_query<'q>(
    sql: &'q str,
    execution: &PmExecution,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    sqlx::query(sql)
        .bind(execution.id.to_string())
        .bind(execution.pm_schedule_id.to_string())
        .bind(execution.executed_by_id.to_string())
        .bind(execution.status.as_str())
        .bind(execution.notes.clone())
        .bind(encode_optional_timestamp(execution.started_at))
        .bind(encode_optional_timestamp(execution.completed_at))
        .bind(encode_optional_timestamp(execution.next_due_calculated))
        .bind(encode_timestamp(execution.created_at))
        .bind(encode_timestamp(execution.updated_at))
}

/// `SQLite`-backed preventive maintenance execution repository.
#[derive(Clone)]
pub struct SqlitePmExecutionRepository {
    pool: SqlitePool,
}

impl SqlitePmExecutionRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PmExecutionRepository for SqlitePmExecutionRepository {
    fn create(
        &self,
        execution: PmExecution,
    ) -> impl Future<Output = Result<PmExecution, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            insert_query(INSERT, &execution)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(execution)
        }
    }

    fn get_by_id(
        &self,
        id: PmExecutionId,
    ) -> impl Future<Output = Result<Option<PmExecution>, PmTrackError>> + Send {
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
        filter: &PmExecutionFilter,
    ) -> impl Future<Output = Result<Vec<PmExecution>, PmTrackError>> + Send {
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
        execution: PmExecution,
    ) -> impl Future<Output = Result<PmExecution, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(execution.status.as_str())
                .bind(&execution.notes)
                .bind(encode_optional_timestamp(execution.started_at))
                .bind(encode_optional_timestamp(execution.completed_at))
                .bind(encode_optional_timestamp(execution.next_due_calculated))
                .bind(encode_timestamp(execution.updated_at))
                .bind(execution.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(execution)
        }
    }

    fn complete(
        &self,
        execution: PmExecution,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<(PmExecution, PmSchedule), PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            insert_query(UPSERT, &execution)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            update_schedule(&schedule)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            tx.commit().await.map_err(StorageError::from)?;

            Ok((execution, schedule))
        }
    }

    fn delete(&self, id: PmExecutionId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
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
