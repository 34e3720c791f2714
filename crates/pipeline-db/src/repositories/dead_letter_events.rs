use async_trait::async_trait;
use sqlx::PgPool;

use pipeline_core::domain::DeadLetterEvent;
use pipeline_core::ports::DeadLetterEventRepository;

use crate::models::DeadLetterEventRow;

/// Write-once persistence adapter for [`DeadLetterEvent`] against the
/// `dead_letter_events` table.
pub struct PgDeadLetterEventRepository {
    pool: PgPool,
}

impl PgDeadLetterEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeadLetterEventRepository for PgDeadLetterEventRepository {
    async fn create(&self, event: DeadLetterEvent) -> anyhow::Result<DeadLetterEvent> {
        let row = DeadLetterEventRow::from(&event);
        sqlx::query(
            "INSERT INTO dead_letter_events \
             (id, pipeline_run_id, step_run_id, failure_reason, retry_count, \
              context, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(row.id)
        .bind(row.pipeline_run_id)
        .bind(row.step_run_id)
        .bind(&row.failure_reason)
        .bind(row.retry_count)
        .bind(&row.context)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }
}
