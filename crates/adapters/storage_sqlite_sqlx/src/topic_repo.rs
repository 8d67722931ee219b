//! `SQLite` implementation of [`TopicRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pmtrack_app::ports::TopicRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::TopicId;
use pmtrack_domain::topic::Topic;

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::StorageError;

struct Wrapper(Topic);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Topic> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Topic {
            id: parsed(row, "id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO topics (id, title, description, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM topics WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM topics ORDER BY title";
const UPDATE: &str =
    "UPDATE topics SET title = ?, description = ?, is_active = ?, updated_at = ? WHERE id = ?";

/// `SQLite`-backed topic repository.
#[derive(Clone)]
pub struct SqliteTopicRepository {
    pool: SqlitePool,
}

impl SqliteTopicRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TopicRepository for SqliteTopicRepository {
    fn create(&self, topic: Topic) -> impl Future<Output = Result<Topic, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(topic.id.to_string())
                .bind(&topic.title)
                .bind(&topic.description)
                .bind(topic.is_active)
                .bind(encode_timestamp(topic.created_at))
                .bind(encode_timestamp(topic.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(topic)
        }
    }

    fn get_by_id(
        &self,
        id: TopicId,
    ) -> impl Future<Output = Result<Option<Topic>, PmTrackError>> + Send {
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

    fn get_all(&self) -> impl Future<Output = Result<Vec<Topic>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, topic: Topic) -> impl Future<Output = Result<Topic, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&topic.title)
                .bind(&topic.description)
                .bind(topic.is_active)
                .bind(encode_timestamp(topic.updated_at))
                .bind(topic.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(topic)
        }
    }
}
