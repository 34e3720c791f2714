use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::domain::PipelineRun;
use pipeline_core::ports::PipelineRunRepository;

use crate::models::PipelineRunRow;

/// Persistence adapter for [`PipelineRun`] against the `pipeline_runs` table.
pub struct PgPipelineRunRepository {
    pool: PgPool,
}

impl PgPipelineRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineRunRepository for PgPipelineRunRepository {
    async fn create(&self, run: PipelineRun) -> anyhow::Result<PipelineRun> {
        let row = PipelineRunRow::from(&run);
        sqlx::query(
            "INSERT INTO pipeline_runs \
             (id, task_id, tenant_id, status, current_step, pause_reasons, \
              pause_expires_at, started_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(row.id)
        .bind(row.task_id)
        .bind(row.tenant_id)
        .bind(row.status)
        .bind(row.current_step)
        .bind(&row.pause_reasons)
        .bind(row.pause_expires_at)
        .bind(row.started_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(run)
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PipelineRun>> {
        let row = sqlx::query_as::<_, PipelineRunRow>(
            "SELECT id, task_id, tenant_id, status, current_step, pause_reasons, \
                    pause_expires_at, started_at, updated_at \
             FROM pipeline_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PipelineRun::try_from).transpose()
    }

    async fn get_by_task_id(&self, task_id: Uuid) -> anyhow::Result<Option<PipelineRun>> {
        let row = sqlx::query_as::<_, PipelineRunRow>(
            "SELECT id, task_id, tenant_id, status, current_step, pause_reasons, \
                    pause_expires_at, started_at, updated_at \
             FROM pipeline_runs WHERE task_id = $1 \
             ORDER BY started_at DESC LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PipelineRun::try_from).transpose()
    }

    async fn get_all_by_task_id(&self, task_id: Uuid) -> anyhow::Result<Vec<PipelineRun>> {
        let rows = sqlx::query_as::<_, PipelineRunRow>(
            "SELECT id, task_id, tenant_id, status, current_step, pause_reasons, \
                    pause_expires_at, started_at, updated_at \
             FROM pipeline_runs WHERE task_id = $1 \
             ORDER BY started_at DESC",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PipelineRun::try_from).collect()
    }

    async fn update(&self, run: &PipelineRun) -> anyhow::Result<()> {
        let row = PipelineRunRow::from(run);
        let result = sqlx::query(
            "UPDATE pipeline_runs \
             SET status = $1, current_step = $2, pause_reasons = $3, \
                 pause_expires_at = $4, updated_at = $5 \
             WHERE id = $6",
        )
        .bind(row.status)
        .bind(row.current_step)
        .bind(&row.pause_reasons)
        .bind(row.pause_expires_at)
        .bind(row.updated_at)
        .bind(row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("pipeline run {} not found", run.id);
        }

        Ok(())
    }
}
