//! Replay use case (§4.4): fork a fresh pipeline run from an existing
//! one, optionally skipping ahead to a later step.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{PipelineRun, PipelineStatus, StepType};
use crate::error::PipelineError;
use crate::ports::{AuditSink, PipelineRunRepository, PipelineStepRunRepository, TaskRepository};

/// Input to [`ReplayPipeline::execute`].
#[derive(Debug, Clone)]
pub struct ReplayPipelineCommand {
    pub pipeline_run_id: Uuid,
    pub tenant_id: Uuid,
    pub from_step_id: Option<Uuid>,
    pub preserve_approved_artifacts: bool,
}

impl ReplayPipelineCommand {
    pub fn new(pipeline_run_id: Uuid, tenant_id: Uuid) -> Self {
        Self {
            pipeline_run_id,
            tenant_id,
            from_step_id: None,
            preserve_approved_artifacts: true,
        }
    }
}

/// Outcome of a successful replay.
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub new_pipeline_run_id: Uuid,
    pub status: PipelineStatus,
    pub started_from_step: &'static str,
}

/// Creates a new `PipelineRun` for the same task, starting at step 1 or
/// at the step named by `from_step_id`. Execution of that run is then
/// driven by the run-step orchestrator; this use case only forks it.
pub struct ReplayPipeline {
    task_repository: Arc<dyn TaskRepository>,
    pipeline_run_repository: Arc<dyn PipelineRunRepository>,
    pipeline_step_run_repository: Arc<dyn PipelineStepRunRepository>,
    audit_sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl ReplayPipeline {
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        pipeline_run_repository: Arc<dyn PipelineRunRepository>,
        pipeline_step_run_repository: Arc<dyn PipelineStepRunRepository>,
        audit_sink: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            task_repository,
            pipeline_run_repository,
            pipeline_step_run_repository,
            audit_sink,
            clock,
        }
    }

    pub async fn execute(
        &self,
        command: ReplayPipelineCommand,
    ) -> Result<ReplayResult, PipelineError> {
        let original = self
            .pipeline_run_repository
            .get_by_id(command.pipeline_run_id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            .ok_or_else(|| PipelineError::pipeline_run_not_found("Pipeline run not found"))?;

        // Tenant isolation is enforced via the task lookup, not the run
        // row directly, matching the validate and run-step use cases.
        let task = self
            .task_repository
            .get_by_id(original.task_id, command.tenant_id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            .ok_or_else(|| {
                PipelineError::pipeline_run_not_found("Pipeline run not found")
            })?;

        let start_step_number = match command.from_step_id {
            Some(step_id) => {
                let steps = self
                    .pipeline_step_run_repository
                    .get_by_pipeline_run_id(original.id)
                    .await
                    .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;
                steps
                    .into_iter()
                    .find(|step| step.id == step_id)
                    .map(|step| step.step_number)
                    .unwrap_or(1)
            }
            None => 1,
        };

        let now = self.clock.now();
        let new_run = PipelineRun::new_running(Uuid::new_v4(), task.id, command.tenant_id, now);
        let mut new_run = new_run;
        new_run.current_step = start_step_number;

        let new_run = self
            .pipeline_run_repository
            .create(new_run)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        let started_from_step = StepType::from_step_number(start_step_number).normalized_name();

        if let Err(error) = self
            .audit_sink
            .log_event(
                "pipeline_replayed",
                command.tenant_id,
                None,
                "pipeline_run",
                new_run.id,
                json!({
                    "original_pipeline_run_id": original.id,
                    "from_step_id": command.from_step_id,
                    "preserve_approved_artifacts": command.preserve_approved_artifacts,
                    "started_from_step": started_from_step,
                }),
            )
            .await
        {
            tracing::warn!(pipeline_run_id = %new_run.id, %error, "failed to record replay audit event");
        }

        tracing::info!(
            original_pipeline_run_id = %original.id,
            new_pipeline_run_id = %new_run.id,
            started_from_step,
            "replayed pipeline run"
        );

        Ok(ReplayResult {
            new_pipeline_run_id: new_run.id,
            status: new_run.status,
            started_from_step,
        })
    }
}
