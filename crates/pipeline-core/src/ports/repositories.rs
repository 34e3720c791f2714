//! Repository ports (§6): one narrow, object-safe trait per entity, so
//! use cases can be tested against in-memory fakes without a database
//! (§9 design note on abstract repositories).

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AgentRun, Artifact, DeadLetterEvent, PipelineRun, PipelineStepRun, Task};

/// Read-only lookup of tasks, tenant-scoped. Task creation/mutation is
/// owned elsewhere; the pipeline core only ever reads by id.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_by_id(&self, task_id: Uuid, tenant_id: Uuid) -> anyhow::Result<Option<Task>>;
}

/// Persistence port for [`PipelineRun`].
#[async_trait]
pub trait PipelineRunRepository: Send + Sync {
    async fn create(&self, run: PipelineRun) -> anyhow::Result<PipelineRun>;

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PipelineRun>>;

    /// The most-recently-created run for a task.
    async fn get_by_task_id(&self, task_id: Uuid) -> anyhow::Result<Option<PipelineRun>>;

    /// All runs for a task, most recent first.
    async fn get_all_by_task_id(&self, task_id: Uuid) -> anyhow::Result<Vec<PipelineRun>>;

    async fn update(&self, run: &PipelineRun) -> anyhow::Result<()>;
}

/// Persistence port for [`PipelineStepRun`].
#[async_trait]
pub trait PipelineStepRunRepository: Send + Sync {
    async fn create(&self, step: PipelineStepRun) -> anyhow::Result<PipelineStepRun>;

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PipelineStepRun>>;

    /// All steps of a run, ordered by `step_number`.
    async fn get_by_pipeline_run_id(
        &self,
        pipeline_run_id: Uuid,
    ) -> anyhow::Result<Vec<PipelineStepRun>>;

    async fn update(&self, step: &PipelineStepRun) -> anyhow::Result<()>;
}

/// Persistence port for [`AgentRun`]. Created only on agent success and
/// never updated thereafter, so the port exposes only `create`.
#[async_trait]
pub trait AgentRunRepository: Send + Sync {
    async fn create(&self, agent_run: AgentRun) -> anyhow::Result<AgentRun>;
}

/// Persistence port for [`Artifact`]. Artifacts are never deleted or
/// updated by the core, so the port exposes only `create`.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn create(&self, artifact: Artifact) -> anyhow::Result<Artifact>;
}

/// Persistence port for [`DeadLetterEvent`]. Write-once.
#[async_trait]
pub trait DeadLetterEventRepository: Send + Sync {
    async fn create(&self, event: DeadLetterEvent) -> anyhow::Result<DeadLetterEvent>;
}

// Compile-time assertions: every repository port must be object-safe so
// adapters can be held as `Arc<dyn Trait>`.
const _: () = {
    fn _assert_task(_: &dyn TaskRepository) {}
    fn _assert_run(_: &dyn PipelineRunRepository) {}
    fn _assert_step(_: &dyn PipelineStepRunRepository) {}
    fn _assert_agent_run(_: &dyn AgentRunRepository) {}
    fn _assert_artifact(_: &dyn ArtifactRepository) {}
    fn _assert_dead_letter(_: &dyn DeadLetterEventRepository) {}
};
