//! Validate use case (§4.5): cheap pre-flight eligibility check run
//! before the caller commits to a Run-Step invocation.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cost::estimate_pipeline_cost;
use crate::error::PipelineError;
use crate::ports::{BalanceError, BillingClient, TaskRepository};

/// Input to [`ValidatePipeline::execute`].
#[derive(Debug, Clone, Copy)]
pub struct ValidatePipelineCommand {
    pub task_id: Uuid,
    pub tenant_id: Uuid,
}

/// Outcome of a validation check.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub eligible: bool,
    pub estimated_cost: Decimal,
    pub current_balance: Decimal,
    pub reason: Option<String>,
}

/// Checks whether a tenant has enough credit to run a task's pipeline
/// to completion, without mutating any state.
pub struct ValidatePipeline {
    task_repository: Arc<dyn TaskRepository>,
    billing_client: Arc<dyn BillingClient>,
}

impl ValidatePipeline {
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        billing_client: Arc<dyn BillingClient>,
    ) -> Self {
        Self {
            task_repository,
            billing_client,
        }
    }

    pub async fn execute(
        &self,
        command: ValidatePipelineCommand,
    ) -> Result<ValidationResult, PipelineError> {
        let task = self
            .task_repository
            .get_by_id(command.task_id, command.tenant_id)
            .await
            .map_err(|e| PipelineError::validation_error(e.to_string()))?;

        if task.is_none() {
            return Err(PipelineError::task_not_found(
                "Task not found or access denied",
            ));
        }

        let estimated_cost = estimate_pipeline_cost();

        let current_balance = match self.billing_client.get_balance(command.tenant_id).await {
            Ok(balance) => balance,
            Err(BalanceError::ServiceUnavailable(reason)) => {
                return Err(PipelineError::billing_service_unavailable(
                    "Billing service is currently unavailable",
                    reason,
                ));
            }
            Err(BalanceError::Other(reason)) => {
                return Err(PipelineError::balance_check_failed(
                    "Failed to check credit balance",
                    reason.to_string(),
                ));
            }
        };

        let eligible = current_balance >= estimated_cost;
        let reason = (!eligible).then(|| {
            format!(
                "Insufficient credits. Required: {estimated_cost}, available: {current_balance}"
            )
        });

        tracing::debug!(
            task_id = %command.task_id,
            tenant_id = %command.tenant_id,
            eligible,
            %estimated_cost,
            %current_balance,
            "validated pipeline eligibility"
        );

        Ok(ValidationResult {
            eligible,
            estimated_cost,
            current_balance,
            reason,
        })
    }
}
