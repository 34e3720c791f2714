//! `pipeline cancel` — cancel an in-flight pipeline run.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::SystemClock;
use pipeline_core::usecases::{CancelPipeline, CancelPipelineCommand};
use pipeline_db::repositories::{PgPipelineRunRepository, PgPipelineStepRunRepository};

use crate::collaborators::TracingAuditSink;

pub async fn run_cancel(
    pool: &PgPool,
    pipeline_run_id: Uuid,
    tenant_id: Uuid,
    user_id: Option<Uuid>,
    reason: Option<String>,
) -> anyhow::Result<()> {
    let use_case = CancelPipeline::new(
        Arc::new(PgPipelineRunRepository::new(pool.clone())),
        Arc::new(PgPipelineStepRunRepository::new(pool.clone())),
        Arc::new(TracingAuditSink),
        Arc::new(SystemClock),
    );

    let result = use_case
        .execute(CancelPipelineCommand {
            pipeline_run_id,
            tenant_id,
            user_id,
            reason,
        })
        .await?;

    println!("pipeline_run_id: {}", result.pipeline_run_id);
    println!("previous_status: {}", result.previous_status);
    println!("new_status: {}", result.new_status);
    println!("steps_completed: {}", result.steps_completed);
    println!("steps_cancelled: {}", result.steps_cancelled);
    println!("{}", result.message);

    Ok(())
}
