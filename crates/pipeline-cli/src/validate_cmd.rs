//! `pipeline validate` — check whether a task's tenant has enough
//! credit balance to run the full pipeline.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use pipeline_core::usecases::{ValidatePipeline, ValidatePipelineCommand};
use pipeline_db::repositories::PgTaskRepository;

use crate::collaborators::InMemoryBillingClient;

pub async fn run_validate(pool: &PgPool, task_id: Uuid, tenant_id: Uuid) -> anyhow::Result<()> {
    let task_repository = Arc::new(PgTaskRepository::new(pool.clone()));
    let billing_client = Arc::new(InMemoryBillingClient::new());

    let use_case = ValidatePipeline::new(task_repository, billing_client);
    let result = use_case
        .execute(ValidatePipelineCommand { task_id, tenant_id })
        .await?;

    println!("eligible: {}", result.eligible);
    println!("estimated_cost: {}", result.estimated_cost);
    println!("current_balance: {}", result.current_balance);
    if let Some(reason) = &result.reason {
        println!("reason: {reason}");
    }

    Ok(())
}
