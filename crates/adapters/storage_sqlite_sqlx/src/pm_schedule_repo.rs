//! `SQLite` implementation of [`PmScheduleRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::PmScheduleRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::PmScheduleId;
use pmtrack_domain::pm_schedule::{PmSchedule, PmScheduleFilter};

use crate::codec::{
    encode_optional_timestamp, encode_timestamp, optional_timestamp, parsed, timestamp,
};
use crate::error::StorageError;

struct Wrapper(PmSchedule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(PmSchedule {
            id: parsed(row, "id")?,
            machine_id: parsed(row, "machine_id")?,
            procedure_id: parsed(row, "procedure_id")?,
            user_id: parsed(row, "user_id")?,
            frequency: parsed(row, "frequency")?,
            frequency_value: row.try_get("frequency_value")?,
            last_completed: optional_timestamp(row, "last_completed")?,
            next_due: timestamp(row, "next_due")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO pm_schedules (id, machine_id, procedure_id, user_id, frequency, frequency_value, last_completed, next_due, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM pm_schedules WHERE id = ?";
const UPDATE: &str = "UPDATE pm_schedules SET machine_id = ?, procedure_id = ?, user_id = ?, frequency = ?, frequency_value = ?, last_completed = ?, next_due = ?, is_active = ?, updated_at = ? WHERE id = ?";

/// Bind every mutable column of `schedule` to [`UPDATE`].
pub(crate) fn update_query(
    schedule: &PmSchedule,
) -> sqlx::query::Query<'static, Sqlite, sqlx::sqlite::SqliteArguments<'static>> {
    sqlx::query(UPDATE)
        .bind(schedule.machine_id.to_string())
        .bind(schedule.procedure_id.to_string())
        .bind(schedule.user_id.to_string())
        .bind(schedule.frequency.as_str())
        .bind(schedule.frequency_value)
        .bind(encode_optional_timestamp(schedule.last_completed))
        .bind(encode_timestamp(schedule.next_due))
        .bind(schedule.is_active)
        .bind(encode_timestamp(schedule.updated_at))
        .bind(schedule.id.to_string())
}

fn list_query(filter: &PmScheduleFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM pm_schedules WHERE 1 = 1");
    if let Some(machine_id) = filter.machine_id {
        query
            .push(" AND machine_id = ")
            .push_bind(machine_id.to_string());
    }
    if let Some(procedure_id) = filter.procedure_id {
        query
            .push(" AND procedure_id = ")
            .push_bind(procedure_id.to_string());
    }
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ").push_bind(user_id.to_string());
    }
    if let Some(frequency) = filter.frequency {
        query.push(" AND frequency = ").push_bind(frequency.as_str());
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(at) = filter.due_before {
        query.push(" AND next_due < ").push_bind(encode_timestamp(at));
    }
    if let Some(at) = filter.due_from {
        query.push(" AND next_due >= ").push_bind(encode_timestamp(at));
    }
    if let Some(at) = filter.due_until {
        query.push(" AND next_due <= ").push_bind(encode_timestamp(at));
    }
    query.push(" ORDER BY next_due, rowid");
    query
}

/// `SQLite`-backed preventive maintenance schedule repository.
#[derive(Clone)]
pub struct SqlitePmScheduleRepository {
    pool: SqlitePool,
}

impl SqlitePmScheduleRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PmScheduleRepository for SqlitePmScheduleRepository {
    fn create(
        &self,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<PmSchedule, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(schedule.id.to_string())
                .bind(schedule.machine_id.to_string())
                .bind(schedule.procedure_id.to_string())
                .bind(schedule.user_id.to_string())
                .bind(schedule.frequency.as_str())
                .bind(schedule.frequency_value)
                .bind(encode_optional_timestamp(schedule.last_completed))
                .bind(encode_timestamp(schedule.next_due))
                .bind(schedule.is_active)
                .bind(encode_timestamp(schedule.created_at))
                .bind(encode_timestamp(schedule.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(schedule)
        }
    }

    fn get_by_id(
        &self,
        id: PmScheduleId,
    ) -> impl Future<Output = Result<Option<PmSchedule>, PmTrackError>> + Send {
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
        filter: &PmScheduleFilter,
    ) -> impl Future<Output = Result<Vec<PmSchedule>, PmTrackError>> + Send {
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
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<PmSchedule, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            update_query(&schedule)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(schedule)
        }
    }
}
