use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::domain::Task;
use pipeline_core::ports::TaskRepository;

use crate::models::TaskRow;

/// Tenant-scoped, read-only task lookup against the `tasks` table.
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn get_by_id(&self, task_id: Uuid, tenant_id: Uuid) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT id, tenant_id, title, input_spec FROM tasks WHERE id = $1 AND tenant_id = $2",
        )
        .bind(task_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::from))
    }
}
