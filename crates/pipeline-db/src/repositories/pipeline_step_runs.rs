use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::domain::PipelineStepRun;
use pipeline_core::ports::PipelineStepRunRepository;

use crate::models::PipelineStepRunRow;

/// Persistence adapter for [`PipelineStepRun`] against the
/// `pipeline_step_runs` table.
pub struct PgPipelineStepRunRepository {
    pool: PgPool,
}

impl PgPipelineStepRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStepRunRepository for PgPipelineStepRunRepository {
    async fn create(&self, step: PipelineStepRun) -> anyhow::Result<PipelineStepRun> {
        let row = PipelineStepRunRow::from(&step);
        sqlx::query(
            "INSERT INTO pipeline_step_runs \
             (id, pipeline_run_id, step_number, step_type, status, started_at, \
              completed_at, retry_count, max_retries, input_snapshot) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(row.id)
        .bind(row.pipeline_run_id)
        .bind(row.step_number)
        .bind(row.step_type)
        .bind(row.status)
        .bind(row.started_at)
        .bind(row.completed_at)
        .bind(row.retry_count)
        .bind(row.max_retries)
        .bind(row.input_snapshot)
        .execute(&self.pool)
        .await?;

        Ok(step)
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PipelineStepRun>> {
        let row = sqlx::query_as::<_, PipelineStepRunRow>(
            "SELECT id, pipeline_run_id, step_number, step_type, status, started_at, \
                    completed_at, retry_count, max_retries, input_snapshot \
             FROM pipeline_step_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PipelineStepRun::from))
    }

    async fn get_by_pipeline_run_id(
        &self,
        pipeline_run_id: Uuid,
    ) -> anyhow::Result<Vec<PipelineStepRun>> {
        let rows = sqlx::query_as::<_, PipelineStepRunRow>(
            "SELECT id, pipeline_run_id, step_number, step_type, status, started_at, \
                    completed_at, retry_count, max_retries, input_snapshot \
             FROM pipeline_step_runs WHERE pipeline_run_id = $1 \
             ORDER BY step_number ASC",
        )
        .bind(pipeline_run_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PipelineStepRun::from).collect())
    }

    async fn update(&self, step: &PipelineStepRun) -> anyhow::Result<()> {
        let row = PipelineStepRunRow::from(step);
        let result = sqlx::query(
            "UPDATE pipeline_step_runs \
             SET status = $1, started_at = $2, completed_at = $3, \
                 retry_count = $4, max_retries = $5, input_snapshot = $6 \
             WHERE id = $7",
        )
        .bind(row.status)
        .bind(row.started_at)
        .bind(row.completed_at)
        .bind(row.retry_count)
        .bind(row.max_retries)
        .bind(row.input_snapshot)
        .bind(row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("pipeline step run {} not found", step.id);
        }

        Ok(())
    }
}
