//! `SQLite` implementation of [`IssueRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::IssueRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::IssueId;
use pmtrack_domain::issue::{Issue, IssueFilter, IssueStatus};

use crate::codec::{
    encode_optional_timestamp, encode_timestamp, optional_parsed, optional_timestamp, parsed,
    timestamp,
};
use crate::error::StorageError;

struct Wrapper(Issue);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Issue {
            id: parsed(row, "id")?,
            machine_id: parsed(row, "machine_id")?,
            room_id: optional_parsed(row, "room_id")?,
            reported_by_id: parsed(row, "reported_by_id")?,
            assigned_to_id: optional_parsed(row, "assigned_to_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: parsed(row, "priority")?,
            status: parsed(row, "status")?,
            reported_at: timestamp(row, "reported_at")?,
            resolved_at: optional_timestamp(row, "resolved_at")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO issues (id, machine_id, room_id, reported_by_id, assigned_to_id, title, description, priority, status, reported_at, resolved_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM issues WHERE id = ?";
const UPDATE: &str = "UPDATE issues SET room_id = ?, assigned_to_id = ?, title = ?, description = ?, priority = ?, status = ?, resolved_at = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM issues WHERE id = ?";

fn list_query(filter: &IssueFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM issues WHERE 1 = 1");
    if let Some(machine_id) = filter.machine_id {
        query
            .push(" AND machine_id = ")
            .push_bind(machine_id.to_string());
    }
    if let Some(room_id) = filter.room_id {
        query.push(" AND room_id = ").push_bind(room_id.to_string());
    }
    if let Some(reported_by_id) = filter.reported_by_id {
        query
            .push(" AND reported_by_id = ")
            .push_bind(reported_by_id.to_string());
    }
    if let Some(assigned_to_id) = filter.assigned_to_id {
        query
            .push(" AND assigned_to_id = ")
            .push_bind(assigned_to_id.to_string());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(is_open) = filter.is_open {
        query.push(if is_open {
            " AND status NOT IN ("
        } else {
            " AND status IN ("
        });
        query
            .push_bind(IssueStatus::Resolved.as_str())
            .push(", ")
            .push_bind(IssueStatus::Closed.as_str())
            .push(")");
    }
    query.push(" ORDER BY reported_at DESC, rowid DESC");
    query
}

/// `SQLite`-backed issue repository.
#[derive(Clone)]
pub struct SqliteIssueRepository {
    pool: SqlitePool,
}

impl SqliteIssueRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl IssueRepository for SqliteIssueRepository {
    fn create(&self, issue: Issue) -> impl Future<Output = Result<Issue, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(issue.id.to_string())
                .bind(issue.machine_id.to_string())
                .bind(issue.room_id.map(|id| id.to_string()))
                .bind(issue.reported_by_id.to_string())
                .bind(issue.assigned_to_id.map(|id| id.to_string()))
                .bind(&issue.title)
                .bind(&issue.description)
                .bind(issue.priority.as_str())
                .bind(issue.status.as_str())
                .bind(encode_timestamp(issue.reported_at))
                .bind(encode_optional_timestamp(issue.resolved_at))
                .bind(encode_timestamp(issue.created_at))
                .bind(encode_timestamp(issue.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(issue)
        }
    }

    fn get_by_id(
        &self,
        id: IssueId,
    ) -> impl Future<Output = Result<Option<Issue>, PmTrackError>> + Send {
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
        filter: &IssueFilter,
    ) -> impl Future<Output = Result<Vec<Issue>, PmTrackError>> + Send {
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

    fn update(&self, issue: Issue) -> impl Future<Output = Result<Issue, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(issue.room_id.map(|id| id.to_string()))
                .bind(issue.assigned_to_id.map(|id| id.to_string()))
                .bind(&issue.title)
                .bind(&issue.description)
                .bind(issue.priority.as_str())
                .bind(issue.status.as_str())
                .bind(encode_optional_timestamp(issue.resolved_at))
                .bind(encode_timestamp(issue.updated_at))
                .bind(issue.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(issue)
        }
    }

    fn delete(&self, id: IssueId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
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
