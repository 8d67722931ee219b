//! `SQLite` implementation of [`JobRepository`].
//!
//! Listing builds its `WHERE` clause from the optional filter fields; the
//! assigned-user filter joins the active assignment rows.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::JobRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::JobId;
use pmtrack_domain::job::{Job, JobFilter};
use pmtrack_domain::page::Page;

use crate::codec::{
    encode_optional_timestamp, encode_timestamp, optional_parsed, optional_timestamp, parsed,
    timestamp,
};
use crate::error::StorageError;

struct Wrapper(Job);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Job> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Job {
            id: parsed(row, "id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            topic_id: optional_parsed(row, "topic_id")?,
            room_id: optional_parsed(row, "room_id")?,
            property_id: parsed(row, "property_id")?,
            status: parsed(row, "status")?,
            created_by_id: parsed(row, "created_by_id")?,
            before_image: row.try_get("before_image")?,
            after_image: row.try_get("after_image")?,
            estimated_hours: row.try_get("estimated_hours")?,
            actual_hours: row.try_get("actual_hours")?,
            priority: parsed(row, "priority")?,
            started_at: optional_timestamp(row, "started_at")?,
            completed_at: optional_timestamp(row, "completed_at")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO jobs (id, title, description, topic_id, room_id, property_id, status, created_by_id, before_image, after_image, estimated_hours, actual_hours, priority, started_at, completed_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM jobs WHERE id = ?";
const UPDATE: &str = "UPDATE jobs SET title = ?, description = ?, topic_id = ?, room_id = ?, property_id = ?, status = ?, before_image = ?, after_image = ?, estimated_hours = ?, actual_hours = ?, priority = ?, started_at = ?, completed_at = ?, updated_at = ? WHERE id = ?";
const DELETE_ASSIGNMENTS: &str = "DELETE FROM job_user_assignments WHERE job_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM jobs WHERE id = ?";

fn list_query(filter: &JobFilter, page: Page) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT jobs.* FROM jobs");
    if let Some(user_id) = filter.assigned_user_id {
        query
            .push(" JOIN job_user_assignments AS a ON a.job_id = jobs.id AND a.is_active = 1 AND a.user_id = ")
            .push_bind(user_id.to_string());
    }
    query.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        query.push(" AND jobs.status = ").push_bind(status.as_str());
    }
    if let Some(property_id) = filter.property_id {
        query
            .push(" AND jobs.property_id = ")
            .push_bind(property_id.to_string());
    }
    if let Some(room_id) = filter.room_id {
        query
            .push(" AND jobs.room_id = ")
            .push_bind(room_id.to_string());
    }
    if let Some(topic_id) = filter.topic_id {
        query
            .push(" AND jobs.topic_id = ")
            .push_bind(topic_id.to_string());
    }
    if let Some(created_by_id) = filter.created_by_id {
        query
            .push(" AND jobs.created_by_id = ")
            .push_bind(created_by_id.to_string());
    }
    query
        .push(" ORDER BY jobs.created_at DESC, jobs.rowid DESC LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(page.skip));
    query
}

/// `SQLite`-backed job repository.
#[derive(Clone)]
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl JobRepository for SqliteJobRepository {
    fn create(&self, job: Job) -> impl Future<Output = Result<Job, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(job.id.to_string())
                .bind(&job.title)
                .bind(&job.description)
                .bind(job.topic_id.map(|id| id.to_string()))
                .bind(job.room_id.map(|id| id.to_string()))
                .bind(job.property_id.to_string())
                .bind(job.status.as_str())
                .bind(job.created_by_id.to_string())
                .bind(&job.before_image)
                .bind(&job.after_image)
                .bind(job.estimated_hours)
                .bind(job.actual_hours)
                .bind(job.priority.as_str())
                .bind(encode_optional_timestamp(job.started_at))
                .bind(encode_optional_timestamp(job.completed_at))
                .bind(encode_timestamp(job.created_at))
                .bind(encode_timestamp(job.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(job)
        }
    }

    fn get_by_id(
        &self,
        id: JobId,
    ) -> impl Future<Output = Result<Option<Job>, PmTrackError>> + Send {
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
        filter: &JobFilter,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Job>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        let mut query = list_query(filter, page);
        async move {
            let rows: Vec<Wrapper> = query
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, job: Job) -> impl Future<Output = Result<Job, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&job.title)
                .bind(&job.description)
                .bind(job.topic_id.map(|id| id.to_string()))
                .bind(job.room_id.map(|id| id.to_string()))
                .bind(job.property_id.to_string())
                .bind(job.status.as_str())
                .bind(&job.before_image)
                .bind(&job.after_image)
                .bind(job.estimated_hours)
                .bind(job.actual_hours)
                .bind(job.priority.as_str())
                .bind(encode_optional_timestamp(job.started_at))
                .bind(encode_optional_timestamp(job.completed_at))
                .bind(encode_timestamp(job.updated_at))
                .bind(job.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(job)
        }
    }

    fn delete(&self, id: JobId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let id = id.to_string();
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            sqlx::query(DELETE_ASSIGNMENTS)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            sqlx::query(DELETE_BY_ID)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            tx.commit().await.map_err(StorageError::from)?;

            Ok(())
        }
    }
}
