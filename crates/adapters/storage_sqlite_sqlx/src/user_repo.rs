//! `SQLite` implementation of [`UserRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pmtrack_app::ports::UserRepository;
use pmtrack_domain::error::{PmTrackError, ValidationError};
use pmtrack_domain::id::UserId;
use pmtrack_domain::user::User;

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::{StorageError, on_unique_violation};

/// Wrapper for converting database rows into domain [`User`].
struct Wrapper(User);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<User> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(User {
            id: parsed(row, "id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            phone: row.try_get("phone")?,
            role: parsed(row, "role")?,
            is_active: row.try_get("is_active")?,
            password_hash: row.try_get("password_hash")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO users (id, username, email, first_name, last_name, phone, role, is_active, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
const SELECT_BY_USERNAME: &str = "SELECT * FROM users WHERE username = ?";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = ?";
const SELECT_ALL: &str = "SELECT * FROM users ORDER BY username";
const UPDATE: &str = "UPDATE users SET username = ?, email = ?, first_name = ?, last_name = ?, phone = ?, role = ?, is_active = ?, password_hash = ?, updated_at = ? WHERE id = ?";

/// `users.email` is the only other unique column besides `username`.
fn duplicate_user(message: &str) -> ValidationError {
    if message.contains("users.email") {
        ValidationError::EmailTaken
    } else {
        ValidationError::UsernameTaken
    }
}

/// `SQLite`-backed user repository.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(
        pool: &SqlitePool,
        query: &'static str,
        value: String,
    ) -> Result<Option<User>, PmTrackError> {
        let row: Option<Wrapper> = sqlx::query_as(query)
            .bind(value)
            .fetch_optional(pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }
}

impl UserRepository for SqliteUserRepository {
    fn create(&self, user: User) -> impl Future<Output = Result<User, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(user.id.to_string())
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.phone)
                .bind(user.role.as_str())
                .bind(user.is_active)
                .bind(&user.password_hash)
                .bind(encode_timestamp(user.created_at))
                .bind(encode_timestamp(user.updated_at))
                .execute(&pool)
                .await
                .map_err(|err| on_unique_violation(err, duplicate_user))?;

            Ok(user)
        }
    }

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move { Self::fetch_one_by(&pool, SELECT_BY_ID, id.to_string()).await }
    }

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        let username = username.to_string();
        async move { Self::fetch_one_by(&pool, SELECT_BY_USERNAME, username).await }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        let email = email.to_string();
        async move { Self::fetch_one_by(&pool, SELECT_BY_EMAIL, email).await }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<User>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, user: User) -> impl Future<Output = Result<User, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.phone)
                .bind(user.role.as_str())
                .bind(user.is_active)
                .bind(&user.password_hash)
                .bind(encode_timestamp(user.updated_at))
                .bind(user.id.to_string())
                .execute(&pool)
                .await
                .map_err(|err| on_unique_violation(err, duplicate_user))?;

            Ok(user)
        }
    }
}
