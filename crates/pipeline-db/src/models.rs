//! Row types for the pipeline tables and their conversions to and from
//! `pipeline_core::domain` entities.
//!
//! The domain enums already derive `sqlx::Type` (mapped as `text`), so
//! they bind and fetch directly; only the set-valued `pause_reasons`
//! column needs an explicit conversion step, since Postgres has no
//! native `HashSet` type.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use pipeline_core::domain::{
    AgentRun, AgentType, Artifact, ArtifactStatus, DeadLetterEvent, PauseReason, PipelineRun,
    PipelineStatus, PipelineStepRun, StepStatus, StepType, Task,
};

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub input_spec: String,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            tenant_id: row.tenant_id,
            title: row.title,
            input_spec: row.input_spec,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PipelineRunRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub tenant_id: Uuid,
    pub status: PipelineStatus,
    pub current_step: i32,
    pub pause_reasons: Vec<String>,
    pub pause_expires_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PipelineRunRow> for PipelineRun {
    type Error = anyhow::Error;

    fn try_from(row: PipelineRunRow) -> Result<Self, Self::Error> {
        let pause_reasons: HashSet<PauseReason> = row
            .pause_reasons
            .iter()
            .map(|s| s.parse::<PauseReason>())
            .collect::<Result<_, _>>()?;

        Ok(PipelineRun {
            id: row.id,
            task_id: row.task_id,
            tenant_id: row.tenant_id,
            status: row.status,
            current_step: row.current_step,
            pause_reasons,
            pause_expires_at: row.pause_expires_at,
            started_at: row.started_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&PipelineRun> for PipelineRunRow {
    fn from(run: &PipelineRun) -> Self {
        PipelineRunRow {
            id: run.id,
            task_id: run.task_id,
            tenant_id: run.tenant_id,
            status: run.status,
            current_step: run.current_step,
            pause_reasons: run.pause_reasons.iter().map(|r| r.to_string()).collect(),
            pause_expires_at: run.pause_expires_at,
            started_at: run.started_at,
            updated_at: run.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PipelineStepRunRow {
    pub id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_number: i32,
    pub step_type: StepType,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub input_snapshot: Option<Value>,
}

impl From<PipelineStepRunRow> for PipelineStepRun {
    fn from(row: PipelineStepRunRow) -> Self {
        PipelineStepRun {
            id: row.id,
            pipeline_run_id: row.pipeline_run_id,
            step_number: row.step_number,
            step_type: row.step_type,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            retry_count: row.retry_count,
            max_retries: row.max_retries,
            input_snapshot: row.input_snapshot,
        }
    }
}

impl From<&PipelineStepRun> for PipelineStepRunRow {
    fn from(step: &PipelineStepRun) -> Self {
        PipelineStepRunRow {
            id: step.id,
            pipeline_run_id: step.pipeline_run_id,
            step_number: step.step_number,
            step_type: step.step_type,
            status: step.status,
            started_at: step.started_at,
            completed_at: step.completed_at,
            retry_count: step.retry_count,
            max_retries: step.max_retries,
            input_snapshot: step.input_snapshot.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AgentRunRow {
    pub id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_run_id: Uuid,
    pub agent_type: AgentType,
    pub model: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub estimated_cost_credits: i32,
    pub actual_cost_credits: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl From<AgentRunRow> for AgentRun {
    fn from(row: AgentRunRow) -> Self {
        AgentRun {
            id: row.id,
            pipeline_run_id: row.pipeline_run_id,
            step_run_id: row.step_run_id,
            agent_type: row.agent_type,
            model: row.model,
            prompt_tokens: row.prompt_tokens,
            completion_tokens: row.completion_tokens,
            estimated_cost_credits: row.estimated_cost_credits,
            actual_cost_credits: row.actual_cost_credits,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

impl From<&AgentRun> for AgentRunRow {
    fn from(run: &AgentRun) -> Self {
        AgentRunRow {
            id: run.id,
            pipeline_run_id: run.pipeline_run_id,
            step_run_id: run.step_run_id,
            agent_type: run.agent_type,
            model: run.model.clone(),
            prompt_tokens: run.prompt_tokens,
            completion_tokens: run.completion_tokens,
            estimated_cost_credits: run.estimated_cost_credits,
            actual_cost_credits: run.actual_cost_credits,
            started_at: run.started_at,
            completed_at: run.completed_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ArtifactRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_run_id: Uuid,
    pub artifact_type: StepType,
    pub status: ArtifactStatus,
    pub content: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<ArtifactRow> for Artifact {
    fn from(row: ArtifactRow) -> Self {
        Artifact {
            id: row.id,
            task_id: row.task_id,
            pipeline_run_id: row.pipeline_run_id,
            step_run_id: row.step_run_id,
            artifact_type: row.artifact_type,
            status: row.status,
            content: row.content,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            approved_at: row.approved_at,
        }
    }
}

impl From<&Artifact> for ArtifactRow {
    fn from(artifact: &Artifact) -> Self {
        ArtifactRow {
            id: artifact.id,
            task_id: artifact.task_id,
            pipeline_run_id: artifact.pipeline_run_id,
            step_run_id: artifact.step_run_id,
            artifact_type: artifact.artifact_type,
            status: artifact.status,
            content: artifact.content.clone(),
            version: artifact.version,
            created_at: artifact.created_at,
            updated_at: artifact.updated_at,
            approved_at: artifact.approved_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DeadLetterEventRow {
    pub id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_run_id: Uuid,
    pub failure_reason: String,
    pub retry_count: i32,
    pub context: Value,
    pub created_at: DateTime<Utc>,
}

impl From<DeadLetterEventRow> for DeadLetterEvent {
    fn from(row: DeadLetterEventRow) -> Self {
        DeadLetterEvent {
            id: row.id,
            pipeline_run_id: row.pipeline_run_id,
            step_run_id: row.step_run_id,
            failure_reason: row.failure_reason,
            retry_count: row.retry_count,
            context: row.context,
            created_at: row.created_at,
        }
    }
}

impl From<&DeadLetterEvent> for DeadLetterEventRow {
    fn from(event: &DeadLetterEvent) -> Self {
        DeadLetterEventRow {
            id: event.id,
            pipeline_run_id: event.pipeline_run_id,
            step_run_id: event.step_run_id,
            failure_reason: event.failure_reason.clone(),
            retry_count: event.retry_count,
            context: event.context.clone(),
            created_at: event.created_at,
        }
    }
}
