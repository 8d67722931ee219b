//! `SQLite` implementation of [`AssignmentRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use pmtrack_app::ports::AssignmentRepository;
use pmtrack_domain::assignment::JobUserAssignment;
use pmtrack_domain::error::{PmTrackError, ValidationError};
use pmtrack_domain::id::{AssignmentId, JobId, UserId};

use crate::codec::{encode_timestamp, parsed, timestamp};
use crate::error::{StorageError, on_unique_violation};

struct Wrapper(JobUserAssignment);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<JobUserAssignment> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(JobUserAssignment {
            id: parsed(row, "id")?,
            job_id: parsed(row, "job_id")?,
            user_id: parsed(row, "user_id")?,
            assigned_by_id: parsed(row, "assigned_by_id")?,
            role_in_job: row.try_get("role_in_job")?,
            notes: row.try_get("notes")?,
            is_active: row.try_get("is_active")?,
            assigned_at: timestamp(row, "assigned_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO job_user_assignments (id, job_id, user_id, assigned_by_id, role_in_job, notes, is_active, assigned_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM job_user_assignments WHERE id = ?";
const SELECT_BY_JOB: &str = "SELECT * FROM job_user_assignments WHERE job_id = ? ORDER BY assigned_at DESC, rowid DESC";
const SELECT_ACTIVE: &str =
    "SELECT * FROM job_user_assignments WHERE job_id = ? AND user_id = ? AND is_active = 1";
const UPDATE: &str =
    "UPDATE job_user_assignments SET role_in_job = ?, notes = ?, is_active = ? WHERE id = ?";

/// `SQLite`-backed job assignment repository.
#[derive(Clone)]
pub struct SqliteAssignmentRepository {
    pool: SqlitePool,
}

impl SqliteAssignmentRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AssignmentRepository for SqliteAssignmentRepository {
    fn create(
        &self,
        assignment: JobUserAssignment,
    ) -> impl Future<Output = Result<JobUserAssignment, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(assignment.id.to_string())
                .bind(assignment.job_id.to_string())
                .bind(assignment.user_id.to_string())
                .bind(assignment.assigned_by_id.to_string())
                .bind(&assignment.role_in_job)
                .bind(&assignment.notes)
                .bind(assignment.is_active)
                .bind(encode_timestamp(assignment.assigned_at))
                .execute(&pool)
                .await
                .map_err(|err| {
                    on_unique_violation(err, |_| ValidationError::AlreadyAssigned)
                })?;

            Ok(assignment)
        }
    }

    fn get_by_id(
        &self,
        id: AssignmentId,
    ) -> impl Future<Output = Result<Option<JobUserAssignment>, PmTrackError>> + Send {
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

    fn find_by_job(
        &self,
        job_id: JobId,
    ) -> impl Future<Output = Result<Vec<JobUserAssignment>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_JOB)
                .bind(job_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_active(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<JobUserAssignment>, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_ACTIVE)
                .bind(job_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn update(
        &self,
        assignment: JobUserAssignment,
    ) -> impl Future<Output = Result<JobUserAssignment, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&assignment.role_in_job)
                .bind(&assignment.notes)
                .bind(assignment.is_active)
                .bind(assignment.id.to_string())
                .execute(&pool)
                .await
                .map_err(|err| {
                    on_unique_violation(err, |_| ValidationError::AlreadyAssigned)
                })?;

            Ok(assignment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteJobRepository;
    use crate::fixtures;
    use pmtrack_app::ports::JobRepository;
    use pmtrack_domain::job::Job;
    use pmtrack_domain::user::{User, UserRole};

    async fn setup() -> (SqliteAssignmentRepository, Job, User, User) {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let manager = fixtures::user(&pool, "manager", UserRole::Manager).await;
        let tech = fixtures::user(&pool, "tech", UserRole::Technician).await;
        let job = SqliteJobRepository::new(pool.clone())
            .create(
                Job::builder()
                    .title("Inspect roof")
                    .property_id(property.id)
                    .created_by_id(manager.id)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        (SqliteAssignmentRepository::new(pool), job, manager, tech)
    }

    #[tokio::test]
    async fn should_find_active_assignment_for_user() {
        let (repo, job, manager, tech) = setup().await;
        let assignment = repo
            .create(JobUserAssignment::new(job.id, tech.id, manager.id, None, None).unwrap())
            .await
            .unwrap();

        let active = repo.find_active(job.id, tech.id).await.unwrap().unwrap();
        assert_eq!(active.id, assignment.id);
        assert_eq!(active.role_in_job, JobUserAssignment::DEFAULT_ROLE);
        assert!(repo.find_active(job.id, manager.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_keep_deactivated_rows_in_history() {
        let (repo, job, manager, tech) = setup().await;
        let mut first = repo
            .create(JobUserAssignment::new(job.id, tech.id, manager.id, None, None).unwrap())
            .await
            .unwrap();
        first.is_active = false;
        repo.update(first.clone()).await.unwrap();
        let second = repo
            .create(
                JobUserAssignment::new(
                    job.id,
                    tech.id,
                    manager.id,
                    Some("LEAD".to_string()),
                    Some("back on it".to_string()),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let history = repo.find_by_job(job.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert!(!history[1].is_active);
        let fetched = repo.get_by_id(first.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn should_reject_second_active_assignment_for_same_user() {
        let (repo, job, manager, tech) = setup().await;
        repo.create(JobUserAssignment::new(job.id, tech.id, manager.id, None, None).unwrap())
            .await
            .unwrap();

        let duplicate = JobUserAssignment::new(job.id, tech.id, manager.id, None, None).unwrap();
        assert!(matches!(
            repo.create(duplicate).await,
            Err(PmTrackError::Validation(ValidationError::AlreadyAssigned))
        ));
    }

    #[tokio::test]
    async fn should_let_only_one_of_two_concurrent_assignments_win() {
        let (repo, job, manager, tech) = setup().await;
        let first = JobUserAssignment::new(job.id, tech.id, manager.id, None, None).unwrap();
        let second = JobUserAssignment::new(job.id, tech.id, manager.id, None, None).unwrap();

        let (a, b) = tokio::join!(repo.create(first), repo.create(second));
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(PmTrackError::Validation(ValidationError::AlreadyAssigned))
        )));
    }
}
