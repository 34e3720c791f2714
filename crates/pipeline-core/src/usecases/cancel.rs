//! Cancel use case (§4.3): stop a pipeline run without discarding the
//! work it already produced.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{PipelineStatus, StepStatus};
use crate::error::PipelineError;
use crate::ports::{AuditSink, PipelineRunRepository, PipelineStepRunRepository};

/// Input to [`CancelPipeline::execute`].
#[derive(Debug, Clone)]
pub struct CancelPipelineCommand {
    pub pipeline_run_id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub reason: Option<String>,
}

/// Outcome of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelResult {
    pub pipeline_run_id: Uuid,
    pub previous_status: PipelineStatus,
    pub new_status: PipelineStatus,
    pub steps_completed: usize,
    pub steps_cancelled: usize,
    pub message: String,
}

/// Cancels a pipeline run: every `running` step is marked `cancelled`,
/// every `completed` step and its artifacts are left untouched, and the
/// run itself transitions to `cancelled`.
pub struct CancelPipeline {
    pipeline_run_repository: Arc<dyn PipelineRunRepository>,
    pipeline_step_run_repository: Arc<dyn PipelineStepRunRepository>,
    audit_sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl CancelPipeline {
    pub fn new(
        pipeline_run_repository: Arc<dyn PipelineRunRepository>,
        pipeline_step_run_repository: Arc<dyn PipelineStepRunRepository>,
        audit_sink: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline_run_repository,
            pipeline_step_run_repository,
            audit_sink,
            clock,
        }
    }

    pub async fn execute(
        &self,
        command: CancelPipelineCommand,
    ) -> Result<CancelResult, PipelineError> {
        let mut run = self
            .pipeline_run_repository
            .get_by_id(command.pipeline_run_id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            .ok_or_else(|| PipelineError::pipeline_not_found("Pipeline run not found"))?;

        if run.tenant_id != command.tenant_id {
            return Err(PipelineError::unauthorized(
                "Pipeline run does not belong to this tenant",
            ));
        }

        if matches!(run.status, PipelineStatus::Completed | PipelineStatus::Cancelled) {
            return Err(PipelineError::cannot_cancel_completed(format!(
                "Cannot cancel a pipeline run that is already {}",
                run.status
            )));
        }

        let previous_status = run.status;
        let now = self.clock.now();

        let steps = self
            .pipeline_step_run_repository
            .get_by_pipeline_run_id(run.id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        let mut steps_completed = 0usize;
        let mut steps_cancelled = 0usize;

        for mut step in steps {
            match step.status {
                StepStatus::Completed => steps_completed += 1,
                StepStatus::Running => {
                    step.cancel(now);
                    self.pipeline_step_run_repository
                        .update(&step)
                        .await
                        .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;
                    steps_cancelled += 1;
                }
                StepStatus::Pending | StepStatus::Failed | StepStatus::Cancelled => {}
            }
        }

        run.cancel(now);
        self.pipeline_run_repository
            .update(&run)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        if let Err(error) = self
            .audit_sink
            .log_event(
                "pipeline_cancelled",
                command.tenant_id,
                command.user_id,
                "pipeline_run",
                run.id,
                json!({
                    "previous_status": previous_status.to_string(),
                    "reason": command.reason,
                    "steps_completed": steps_completed,
                    "steps_cancelled": steps_cancelled,
                }),
            )
            .await
        {
            tracing::warn!(pipeline_run_id = %run.id, %error, "failed to record cancellation audit event");
        }

        tracing::info!(
            pipeline_run_id = %run.id,
            %previous_status,
            steps_completed,
            steps_cancelled,
            "cancelled pipeline run"
        );

        Ok(CancelResult {
            pipeline_run_id: run.id,
            previous_status,
            new_status: run.status,
            steps_completed,
            steps_cancelled,
            message: format!(
                "Pipeline run cancelled; {steps_completed} step(s) completed, {steps_cancelled} step(s) cancelled"
            ),
        })
    }
}
