use async_trait::async_trait;
use sqlx::PgPool;

use pipeline_core::domain::AgentRun;
use pipeline_core::ports::AgentRunRepository;

use crate::models::AgentRunRow;

/// Write-once persistence adapter for [`AgentRun`] against the
/// `agent_runs` table.
pub struct PgAgentRunRepository {
    pool: PgPool,
}

impl PgAgentRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRunRepository for PgAgentRunRepository {
    async fn create(&self, agent_run: AgentRun) -> anyhow::Result<AgentRun> {
        let row = AgentRunRow::from(&agent_run);
        sqlx::query(
            "INSERT INTO agent_runs \
             (id, pipeline_run_id, step_run_id, agent_type, model, prompt_tokens, \
              completion_tokens, estimated_cost_credits, actual_cost_credits, \
              started_at, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(row.id)
        .bind(row.pipeline_run_id)
        .bind(row.step_run_id)
        .bind(row.agent_type)
        .bind(&row.model)
        .bind(row.prompt_tokens)
        .bind(row.completion_tokens)
        .bind(row.estimated_cost_credits)
        .bind(row.actual_cost_credits)
        .bind(row.started_at)
        .bind(row.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(agent_run)
    }
}
