//! `pipeline run-step` — advance a task's pipeline by one step.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::SystemClock;
use pipeline_core::usecases::{RunPipelineStep, RunStepCommand, RunStepStatus};
use pipeline_db::repositories::{
    PgAgentRunRepository, PgArtifactRepository, PgDeadLetterEventRepository,
    PgPipelineRunRepository, PgPipelineStepRunRepository, PgTaskRepository,
};

use crate::collaborators::{CannedAgentExecutor, InMemoryBillingClient, LoggingRetryScheduler};

pub async fn run_run_step(pool: &PgPool, task_id: Uuid, tenant_id: Uuid) -> anyhow::Result<()> {
    let use_case = RunPipelineStep::new(
        Arc::new(PgTaskRepository::new(pool.clone())),
        Arc::new(PgPipelineRunRepository::new(pool.clone())),
        Arc::new(PgPipelineStepRunRepository::new(pool.clone())),
        Arc::new(PgAgentRunRepository::new(pool.clone())),
        Arc::new(PgArtifactRepository::new(pool.clone())),
        Arc::new(InMemoryBillingClient::new()),
        Arc::new(CannedAgentExecutor),
        Arc::new(SystemClock),
    )
    .with_retry_scheduler(Arc::new(LoggingRetryScheduler))
    .with_dead_letter_repository(Arc::new(PgDeadLetterEventRepository::new(pool.clone())));

    let result = use_case
        .execute(RunStepCommand { task_id, tenant_id })
        .await?;

    println!("pipeline_run_id: {}", result.pipeline_run_id);
    println!("step_number: {}", result.step_number);
    println!("step_type: {}", result.step_type);
    match result.status {
        RunStepStatus::Completed => println!("status: completed"),
        RunStepStatus::PausedInsufficientCredits => {
            println!("status: paused_insufficient_credits")
        }
    }
    if let Some(artifact_id) = result.artifact_id {
        println!("artifact_id: {artifact_id}");
    }

    Ok(())
}
