//! Run-Step Orchestrator (§4.2): the heart of the core. One invocation
//! advances one task's pipeline by at most one step.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{
    AgentRun, Artifact, DeadLetterEvent, PipelineRun, PipelineStatus, PipelineStepRun, StepStatus,
    StepType,
};
use crate::error::PipelineError;
use crate::ports::{
    AgentExecutor, AgentRunRepository, ArtifactRepository, BillingClient, ConsumeCreditsError,
    DeadLetterEventRepository, PipelineRunRepository, PipelineStepRunRepository, RetryScheduler,
    TaskRepository,
};

/// Input to [`RunPipelineStep::execute`].
#[derive(Debug, Clone, Copy)]
pub struct RunStepCommand {
    pub task_id: Uuid,
    pub tenant_id: Uuid,
}

/// The two success shapes of a run-step invocation (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStepStatus {
    Completed,
    PausedInsufficientCredits,
}

/// Outcome of a successful (possibly paused) run-step invocation.
#[derive(Debug, Clone)]
pub struct RunStepResult {
    pub pipeline_run_id: Uuid,
    pub step_number: i32,
    pub step_type: StepType,
    pub status: RunStepStatus,
    pub artifact_id: Option<Uuid>,
}

/// Advances one task's pipeline by one step: looks up or creates the
/// run, executes the appropriate agent, records the artifact, bills the
/// tenant, and advances the run. Retry scheduling and dead-lettering are
/// optional collaborators: when absent, an agent failure simply leaves
/// the step `failed` and the run unchanged (§4.2 step 7).
pub struct RunPipelineStep {
    task_repository: Arc<dyn TaskRepository>,
    pipeline_run_repository: Arc<dyn PipelineRunRepository>,
    pipeline_step_run_repository: Arc<dyn PipelineStepRunRepository>,
    agent_run_repository: Arc<dyn AgentRunRepository>,
    artifact_repository: Arc<dyn ArtifactRepository>,
    billing_client: Arc<dyn BillingClient>,
    agent_executor: Arc<dyn AgentExecutor>,
    retry_scheduler: Option<Arc<dyn RetryScheduler>>,
    dead_letter_repository: Option<Arc<dyn DeadLetterEventRepository>>,
    clock: Arc<dyn Clock>,
}

impl RunPipelineStep {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        pipeline_run_repository: Arc<dyn PipelineRunRepository>,
        pipeline_step_run_repository: Arc<dyn PipelineStepRunRepository>,
        agent_run_repository: Arc<dyn AgentRunRepository>,
        artifact_repository: Arc<dyn ArtifactRepository>,
        billing_client: Arc<dyn BillingClient>,
        agent_executor: Arc<dyn AgentExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            task_repository,
            pipeline_run_repository,
            pipeline_step_run_repository,
            agent_run_repository,
            artifact_repository,
            billing_client,
            agent_executor,
            retry_scheduler: None,
            dead_letter_repository: None,
            clock,
        }
    }

    pub fn with_retry_scheduler(mut self, retry_scheduler: Arc<dyn RetryScheduler>) -> Self {
        self.retry_scheduler = Some(retry_scheduler);
        self
    }

    pub fn with_dead_letter_repository(
        mut self,
        dead_letter_repository: Arc<dyn DeadLetterEventRepository>,
    ) -> Self {
        self.dead_letter_repository = Some(dead_letter_repository);
        self
    }

    pub async fn execute(&self, command: RunStepCommand) -> Result<RunStepResult, PipelineError> {
        let task = self
            .task_repository
            .get_by_id(command.task_id, command.tenant_id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            .ok_or_else(|| PipelineError::task_not_found("Task not found or access denied"))?;

        let now = self.clock.now();

        // Step 2: acquire the pipeline run, reusing a `running` one.
        let existing = self
            .pipeline_run_repository
            .get_by_task_id(task.id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        let run = match existing {
            Some(run) if run.status == PipelineStatus::Running => run,
            _ => {
                let run = PipelineRun::new_running(Uuid::new_v4(), task.id, task.tenant_id, now);
                self.pipeline_run_repository
                    .create(run)
                    .await
                    .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            }
        };

        // Step 3: cancellation checkpoint A, a fresh re-read.
        let run = self.reread_run(run.id).await?;
        if run.status == PipelineStatus::Cancelled {
            return Err(PipelineError::pipeline_cancelled(
                "Pipeline run was cancelled",
            ));
        }

        // Step 4: create the step run, or resume one left `pending` by a
        // scheduled retry so the same id (and `retry_count`) carries
        // through to the idempotency key in step 12.
        let step_number = run.current_step;
        let step_type = StepType::from_step_number(step_number);
        let pending_retry = self
            .pipeline_step_run_repository
            .get_by_pipeline_run_id(run.id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            .into_iter()
            .find(|s| s.step_number == step_number && s.status == StepStatus::Pending);

        let mut step = match pending_retry {
            Some(mut step) => {
                step.resume_for_retry(now);
                self.pipeline_step_run_repository
                    .update(&step)
                    .await
                    .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;
                step
            }
            None => {
                let step = PipelineStepRun::new_running(Uuid::new_v4(), run.id, step_number, now);
                self.pipeline_step_run_repository
                    .create(step)
                    .await
                    .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            }
        };
        let step_id = step.id;

        // Step 5: snapshot the frozen input and persist it.
        let input_snapshot = json!({
            "task_id": task.id,
            "task_title": task.title,
            "task_input_spec": task.input_spec,
            "pipeline_run_id": run.id,
            "current_step": step_number,
            "snapshot_at": now.to_rfc3339(),
        });
        step.input_snapshot = Some(input_snapshot.clone());
        self.pipeline_step_run_repository
            .update(&step)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        // Step 6: cancellation checkpoint B.
        let run = self.reread_run(run.id).await?;
        if run.status == PipelineStatus::Cancelled {
            step.cancel(self.clock.now());
            self.pipeline_step_run_repository
                .update(&step)
                .await
                .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;
            return Err(PipelineError::pipeline_cancelled(
                "Pipeline run was cancelled",
            ));
        }

        // Step 7: invoke the agent.
        let agent_type = step_type.agent_type();
        let agent_inputs = json!({
            "task_spec": task.input_spec,
            "task_title": task.title,
            "input_snapshot": input_snapshot,
        });

        let agent_result = match self.agent_executor.execute(agent_type, agent_inputs).await {
            Ok(result) => result,
            Err(error) => return self.handle_agent_failure(run, step, step_id, error).await,
        };

        // Step 8: record the agent run. Actual cost equals the estimate
        // reported by the executor in this version (§4.2 step 8).
        let agent_run = AgentRun {
            id: Uuid::new_v4(),
            pipeline_run_id: run.id,
            step_run_id: step_id,
            agent_type,
            model: agent_result.model.clone(),
            prompt_tokens: agent_result.prompt_tokens,
            completion_tokens: agent_result.completion_tokens,
            estimated_cost_credits: agent_result.estimated_cost_credits,
            actual_cost_credits: agent_result.estimated_cost_credits,
            started_at: step.started_at.unwrap_or(now),
            completed_at: self.clock.now(),
        };
        self.agent_run_repository
            .create(agent_run.clone())
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        // Step 9: create the artifact.
        let artifact = Artifact::new_for_step(
            Uuid::new_v4(),
            task.id,
            run.id,
            step_id,
            step_type,
            agent_result.output,
            self.clock.now(),
        );
        let artifact = self
            .artifact_repository
            .create(artifact)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        // Step 10: mark the step completed.
        step.complete(self.clock.now());
        self.pipeline_step_run_repository
            .update(&step)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        // Step 11: cancellation checkpoint C. The artifact is retained
        // even though the step reverts to `cancelled`.
        let mut run = self.reread_run(run.id).await?;
        if run.status == PipelineStatus::Cancelled {
            step.cancel(self.clock.now());
            self.pipeline_step_run_repository
                .update(&step)
                .await
                .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;
            return Err(PipelineError::pipeline_cancelled(
                "Pipeline run was cancelled",
            ));
        }

        // Step 12: charge credits.
        let amount = Decimal::from(agent_run.actual_cost_credits);
        let charge_result = self
            .billing_client
            .consume_credits(
                task.tenant_id,
                amount,
                &step.idempotency_key(),
                "pipeline_step",
                step_id,
                json!({
                    "pipeline_run_id": run.id,
                    "step_run_id": step_id,
                    "step_type": step_type.to_string(),
                    "retry_count": step.retry_count,
                }),
            )
            .await;

        match charge_result {
            Ok(()) => {}
            Err(ConsumeCreditsError::InsufficientCredits { .. }) => {
                run.pause_for_insufficient_credit(self.clock.now());
                self.pipeline_run_repository
                    .update(&run)
                    .await
                    .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

                tracing::info!(
                    pipeline_run_id = %run.id,
                    step_run_id = %step_id,
                    "paused pipeline run for insufficient credits"
                );

                return Ok(RunStepResult {
                    pipeline_run_id: run.id,
                    step_number,
                    step_type,
                    status: RunStepStatus::PausedInsufficientCredits,
                    artifact_id: Some(artifact.id),
                });
            }
            Err(ConsumeCreditsError::Other(error)) => {
                return Err(PipelineError::pipeline_execution_error(error.to_string()));
            }
        }

        // Step 13: advance the run.
        run.advance(self.clock.now());
        self.pipeline_run_repository
            .update(&run)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        tracing::info!(
            pipeline_run_id = %run.id,
            step_number,
            %step_type,
            "completed pipeline step"
        );

        Ok(RunStepResult {
            pipeline_run_id: run.id,
            step_number,
            step_type,
            status: RunStepStatus::Completed,
            artifact_id: Some(artifact.id),
        })
    }

    async fn reread_run(&self, run_id: Uuid) -> Result<PipelineRun, PipelineError> {
        self.pipeline_run_repository
            .get_by_id(run_id)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?
            .ok_or_else(|| PipelineError::pipeline_run_not_found("Pipeline run not found"))
    }

    async fn handle_agent_failure(
        &self,
        mut run: PipelineRun,
        mut step: PipelineStepRun,
        step_id: Uuid,
        error: anyhow::Error,
    ) -> Result<RunStepResult, PipelineError> {
        let now = self.clock.now();
        step.fail(now);

        if let (Some(retry_scheduler), true) = (&self.retry_scheduler, step.is_retryable()) {
            step.reset_for_retry();
            self.pipeline_step_run_repository
                .update(&step)
                .await
                .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

            retry_scheduler
                .schedule_retry(step_id, step.retry_count)
                .await
                .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

            tracing::warn!(
                step_run_id = %step_id,
                retry_count = step.retry_count,
                %error,
                "agent execution failed, retry scheduled"
            );

            return Err(PipelineError::agent_execution_failed_retry_scheduled(
                "Agent execution failed; a retry has been scheduled",
                error.to_string(),
            ));
        }

        self.pipeline_step_run_repository
            .update(&step)
            .await
            .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

        if let Some(dead_letter_repository) = &self.dead_letter_repository {
            let event = DeadLetterEvent {
                id: Uuid::new_v4(),
                pipeline_run_id: run.id,
                step_run_id: step_id,
                failure_reason: error.to_string(),
                retry_count: step.retry_count,
                context: json!({ "step_number": step.step_number }),
                created_at: now,
            };
            dead_letter_repository
                .create(event)
                .await
                .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

            run.fail(now);
            self.pipeline_run_repository
                .update(&run)
                .await
                .map_err(|e| PipelineError::pipeline_execution_error(e.to_string()))?;

            tracing::error!(
                step_run_id = %step_id,
                %error,
                "agent execution failed, retries exhausted, dead-lettered"
            );
        } else {
            tracing::error!(step_run_id = %step_id, %error, "agent execution failed");
        }

        Err(PipelineError::agent_execution_failed(
            "Agent execution failed",
            error.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::clock::FixedClock;
    use crate::domain::pipeline_step_run::DEFAULT_MAX_RETRIES;
    use crate::domain::Task;
    use crate::testing::fakes::{
        FailingAgentExecutor, FakeAgentExecutor, FakeAgentRunRepository, FakeArtifactRepository,
        FakeBillingClient, FakeDeadLetterEventRepository, FakePipelineRunRepository,
        FakePipelineStepRunRepository, FakeRetryScheduler, FakeTaskRepository,
    };

    fn task(tenant_id: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            tenant_id,
            title: "Build a thing".to_string(),
            input_spec: "spec".to_string(),
        }
    }

    #[tokio::test]
    async fn first_invocation_creates_a_running_step_one() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::with_balance(
            tenant_id,
            Decimal::from(1000),
        ));
        let executor = Arc::new(FakeAgentExecutor::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks, runs, steps, agent_runs, artifacts, billing, executor, clock,
        );

        let result = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap();

        assert_eq!(result.step_number, 1);
        assert_eq!(result.step_type, StepType::Analysis);
        assert_eq!(result.status, RunStepStatus::Completed);
        assert!(result.artifact_id.is_some());
    }

    #[tokio::test]
    async fn insufficient_credits_pauses_without_rolling_back_artifact() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::with_balance(tenant_id, Decimal::from(0)));
        let executor = Arc::new(FakeAgentExecutor::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks, runs, steps, agent_runs, artifacts.clone(), billing, executor, clock,
        );

        let result = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap();

        assert_eq!(result.status, RunStepStatus::PausedInsufficientCredits);
        assert!(result.artifact_id.is_some());
        assert_eq!(artifacts.count().await, 1);
    }

    #[tokio::test]
    async fn agent_failure_without_retry_scheduler_fails_the_step_only() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::with_balance(
            tenant_id,
            Decimal::from(1000),
        ));
        let executor = Arc::new(FailingAgentExecutor);
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks, runs, steps, agent_runs, artifacts, billing, executor, clock,
        );

        let err = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "AGENT_EXECUTION_FAILED");
    }

    #[tokio::test]
    async fn agent_failure_with_retry_scheduler_schedules_retry() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::with_balance(
            tenant_id,
            Decimal::from(1000),
        ));
        let executor = Arc::new(FailingAgentExecutor);
        let retry_scheduler = Arc::new(FakeRetryScheduler::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks, runs, steps, agent_runs, artifacts, billing, executor, clock,
        )
        .with_retry_scheduler(retry_scheduler.clone());

        let err = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "AGENT_EXECUTION_FAILED_RETRY_SCHEDULED");
        assert_eq!(retry_scheduler.scheduled_count().await, 1);
    }

    #[tokio::test]
    async fn second_invocation_reuses_the_running_run_and_advances() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::with_balance(
            tenant_id,
            Decimal::from(1000),
        ));
        let executor = Arc::new(FakeAgentExecutor::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks, runs, steps, agent_runs, artifacts, billing, executor, clock,
        );

        let first = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap();
        let second = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap();

        assert_eq!(first.pipeline_run_id, second.pipeline_run_id);
        assert_eq!(second.step_number, 2);
        assert_eq!(second.step_type, StepType::UserStories);
    }

    #[tokio::test]
    async fn billing_service_error_does_not_advance_the_run() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::failing_service(tenant_id));
        let executor = Arc::new(FakeAgentExecutor::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks,
            runs.clone(),
            steps,
            agent_runs,
            artifacts,
            billing,
            executor,
            clock,
        );

        let err = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "PIPELINE_EXECUTION_ERROR");
        let run = runs.get_by_task_id(task.id).await.unwrap().unwrap();
        assert_eq!(run.current_step, 1);
    }

    #[tokio::test]
    async fn agent_failure_after_retries_exhausted_dead_letters_and_fails_the_run() {
        let tenant_id = Uuid::new_v4();
        let task = task(tenant_id);
        let tasks = Arc::new(FakeTaskRepository::with_tasks(vec![task.clone()]));
        let runs = Arc::new(FakePipelineRunRepository::new());
        let steps = Arc::new(FakePipelineStepRunRepository::new());
        let agent_runs = Arc::new(FakeAgentRunRepository::new());
        let artifacts = Arc::new(FakeArtifactRepository::new());
        let billing = Arc::new(FakeBillingClient::with_balance(
            tenant_id,
            Decimal::from(1000),
        ));
        let executor = Arc::new(FailingAgentExecutor);
        let retry_scheduler = Arc::new(FakeRetryScheduler::new());
        let dead_letters = Arc::new(FakeDeadLetterEventRepository::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));

        let use_case = RunPipelineStep::new(
            tasks,
            runs.clone(),
            steps,
            agent_runs,
            artifacts,
            billing,
            executor,
            clock,
        )
        .with_retry_scheduler(retry_scheduler)
        .with_dead_letter_repository(dead_letters.clone());

        // Exhaust the three retries first.
        for _ in 0..DEFAULT_MAX_RETRIES {
            let _ = use_case
                .execute(RunStepCommand {
                    task_id: task.id,
                    tenant_id,
                })
                .await;
        }

        let err = use_case
            .execute(RunStepCommand {
                task_id: task.id,
                tenant_id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "AGENT_EXECUTION_FAILED");
        assert_eq!(dead_letters.count().await, 1);
        let run = runs.get_by_task_id(task.id).await.unwrap().unwrap();
        assert_eq!(run.status, PipelineStatus::Failed);
    }
}
