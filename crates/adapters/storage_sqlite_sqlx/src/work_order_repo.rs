//! `SQLite` implementation of [`WorkOrderRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use pmtrack_app::ports::WorkOrderRepository;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::WorkOrderId;
use pmtrack_domain::work_order::{WorkOrder, WorkOrderFilter};

use crate::codec::{
    encode_optional_timestamp, encode_timestamp, optional_parsed, optional_timestamp, parsed,
    timestamp,
};
use crate::error::StorageError;

struct Wrapper(WorkOrder);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<WorkOrder> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(WorkOrder {
            id: parsed(row, "id")?,
            machine_id: parsed(row, "machine_id")?,
            created_by_id: parsed(row, "created_by_id")?,
            assigned_to_id: optional_parsed(row, "assigned_to_id")?,
            work_order_type: parsed(row, "work_order_type")?,
            status: parsed(row, "status")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: parsed(row, "priority")?,
            estimated_hours: row.try_get("estimated_hours")?,
            actual_hours: row.try_get("actual_hours")?,
            scheduled_date: optional_timestamp(row, "scheduled_date")?,
            started_at: optional_timestamp(row, "started_at")?,
            completed_at: optional_timestamp(row, "completed_at")?,
            cost_estimate: row.try_get("cost_estimate")?,
            actual_cost: row.try_get("actual_cost")?,
            notes: row.try_get("notes")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO work_orders (id, machine_id, created_by_id, assigned_to_id, work_order_type, status, title, description, priority, estimated_hours, actual_hours, scheduled_date, started_at, completed_at, cost_estimate, actual_cost, notes, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM work_orders WHERE id = ?";
const UPDATE: &str = "UPDATE work_orders SET assigned_to_id = ?, work_order_type = ?, status = ?, title = ?, description = ?, priority = ?, estimated_hours = ?, actual_hours = ?, scheduled_date = ?, started_at = ?, completed_at = ?, cost_estimate = ?, actual_cost = ?, notes = ?, is_active = ?, updated_at = ? WHERE id = ?";

fn list_query(filter: &WorkOrderFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM work_orders WHERE 1 = 1");
    if let Some(machine_id) = filter.machine_id {
        query
            .push(" AND machine_id = ")
            .push_bind(machine_id.to_string());
    }
    if let Some(created_by_id) = filter.created_by_id {
        query
            .push(" AND created_by_id = ")
            .push_bind(created_by_id.to_string());
    }
    if let Some(assigned_to_id) = filter.assigned_to_id {
        query
            .push(" AND assigned_to_id = ")
            .push_bind(assigned_to_id.to_string());
    }
    if let Some(work_order_type) = filter.work_order_type {
        query
            .push(" AND work_order_type = ")
            .push_bind(work_order_type.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    query.push(" ORDER BY created_at DESC, rowid DESC");
    query
}

/// `SQLite`-backed work order repository.
#[derive(Clone)]
pub struct SqliteWorkOrderRepository {
    pool: SqlitePool,
}

impl SqliteWorkOrderRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl WorkOrderRepository for SqliteWorkOrderRepository {
    fn create(
        &self,
        order: WorkOrder,
    ) -> impl Future<Output = Result<WorkOrder, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(order.id.to_string())
                .bind(order.machine_id.to_string())
                .bind(order.created_by_id.to_string())
                .bind(order.assigned_to_id.map(|id| id.to_string()))
                .bind(order.work_order_type.as_str())
                .bind(order.status.as_str())
                .bind(&order.title)
                .bind(&order.description)
                .bind(order.priority.as_str())
                .bind(order.estimated_hours)
                .bind(order.actual_hours)
                .bind(encode_optional_timestamp(order.scheduled_date))
                .bind(encode_optional_timestamp(order.started_at))
                .bind(encode_optional_timestamp(order.completed_at))
                .bind(order.cost_estimate)
                .bind(order.actual_cost)
                .bind(&order.notes)
                .bind(order.is_active)
                .bind(encode_timestamp(order.created_at))
                .bind(encode_timestamp(order.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(order)
        }
    }

    fn get_by_id(
        &self,
        id: WorkOrderId,
    ) -> impl Future<Output = Result<Option<WorkOrder>, PmTrackError>> + Send {
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
        filter: &WorkOrderFilter,
    ) -> impl Future<Output = Result<Vec<WorkOrder>, PmTrackError>> + Send {
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
        order: WorkOrder,
    ) -> impl Future<Output = Result<WorkOrder, PmTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(order.assigned_to_id.map(|id| id.to_string()))
                .bind(order.work_order_type.as_str())
                .bind(order.status.as_str())
                .bind(&order.title)
                .bind(&order.description)
                .bind(order.priority.as_str())
                .bind(order.estimated_hours)
                .bind(order.actual_hours)
                .bind(encode_optional_timestamp(order.scheduled_date))
                .bind(encode_optional_timestamp(order.started_at))
                .bind(encode_optional_timestamp(order.completed_at))
                .bind(order.cost_estimate)
                .bind(order.actual_cost)
                .bind(&order.notes)
                .bind(order.is_active)
                .bind(encode_timestamp(order.updated_at))
                .bind(order.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(order)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pmtrack_domain::machine::Machine;
    use pmtrack_domain::priority::Priority;
    use pmtrack_domain::user::{User, UserRole};
    use pmtrack_domain::work_order::{WorkOrderStatus, WorkOrderType};

    async fn setup() -> (SqliteWorkOrderRepository, Machine, User) {
        let pool = fixtures::pool().await;
        let property = fixtures::property(&pool, "HQ").await;
        let room = fixtures::room(&pool, &property, "Plant").await;
        let machine = fixtures::machine(&pool, &room, "Compressor").await;
        let manager = fixtures::user(&pool, "manager", UserRole::Manager).await;
        (SqliteWorkOrderRepository::new(pool), machine, manager)
    }

    fn order(machine: &Machine, creator: &User, title: &str) -> WorkOrder {
        WorkOrder::builder()
            .machine_id(machine.id)
            .created_by_id(creator.id)
            .title(title)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_roundtrip_costs_and_status() {
        let (repo, machine, manager) = setup().await;
        let mut created = repo
            .create(order(&machine, &manager, "Quarterly service"))
            .await
            .unwrap();

        created.cost_estimate = Some(12_550);
        created.set_status(WorkOrderStatus::InProgress, pmtrack_domain::time::now());
        repo.update(created.clone()).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.cost_estimate, Some(12_550));
        assert_eq!(fetched.status, WorkOrderStatus::InProgress);
        assert!(fetched.started_at.is_some());
        assert_eq!(fetched.work_order_type, WorkOrderType::Preventive);
    }

    #[tokio::test]
    async fn should_filter_by_priority_and_activity() {
        let (repo, machine, manager) = setup().await;
        let mut urgent = order(&machine, &manager, "Leak");
        urgent.priority = Priority::Critical;
        repo.create(urgent).await.unwrap();
        let mut retired = repo
            .create(order(&machine, &manager, "Old"))
            .await
            .unwrap();
        retired.deactivate();
        repo.update(retired).await.unwrap();

        let critical = repo
            .list(&WorkOrderFilter {
                priority: Some(Priority::Critical),
                ..WorkOrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].title, "Leak");

        let active = repo
            .list(&WorkOrderFilter {
                is_active: Some(true),
                ..WorkOrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(repo.list(&WorkOrderFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_return_none_when_work_order_not_found() {
        let (repo, _, _) = setup().await;
        assert!(repo.get_by_id(WorkOrderId::new()).await.unwrap().is_none());
    }
}
