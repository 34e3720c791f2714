//! `pipeline replay` — start a fresh run for a task, optionally resuming
//! from a specific step.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::SystemClock;
use pipeline_core::usecases::{ReplayPipeline, ReplayPipelineCommand};
use pipeline_db::repositories::{
    PgPipelineRunRepository, PgPipelineStepRunRepository, PgTaskRepository,
};

use crate::collaborators::TracingAuditSink;

pub async fn run_replay(
    pool: &PgPool,
    pipeline_run_id: Uuid,
    tenant_id: Uuid,
    from_step_id: Option<Uuid>,
    preserve_approved_artifacts: bool,
) -> anyhow::Result<()> {
    let use_case = ReplayPipeline::new(
        Arc::new(PgTaskRepository::new(pool.clone())),
        Arc::new(PgPipelineRunRepository::new(pool.clone())),
        Arc::new(PgPipelineStepRunRepository::new(pool.clone())),
        Arc::new(TracingAuditSink),
        Arc::new(SystemClock),
    );

    let mut command = ReplayPipelineCommand::new(pipeline_run_id, tenant_id);
    command.from_step_id = from_step_id;
    command.preserve_approved_artifacts = preserve_approved_artifacts;

    let result = use_case.execute(command).await?;

    println!("new_pipeline_run_id: {}", result.new_pipeline_run_id);
    println!("status: {}", result.status);
    println!("started_from_step: {}", result.started_from_step);

    Ok(())
}
