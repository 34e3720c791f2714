//! Fakes backing [`super`]. Each fake holds its state behind a
//! `std::sync::Mutex` and never holds the guard across an `.await`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{AgentRun, AgentType, Artifact, DeadLetterEvent, PipelineRun, PipelineStepRun, Task};
use crate::ports::{
    AgentExecutionResult, AgentExecutor, AgentRunRepository, ArtifactRepository, AuditSink,
    BalanceError, BillingClient, ConsumeCreditsError, DeadLetterEventRepository,
    PipelineRunRepository, PipelineStepRunRepository, RetryScheduler, TaskRepository,
};

#[derive(Default)]
pub struct FakeTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

impl FakeTaskRepository {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }
}

#[async_trait]
impl TaskRepository for FakeTaskRepository {
    async fn get_by_id(&self, task_id: Uuid, tenant_id: Uuid) -> anyhow::Result<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter()
            .find(|t| t.id == task_id && t.tenant_id == tenant_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct FakePipelineRunRepository {
    runs: Mutex<Vec<PipelineRun>>,
}

impl FakePipelineRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a run directly, bypassing `create`, for test setup.
    pub async fn insert(&self, run: PipelineRun) {
        self.runs.lock().unwrap().push(run);
    }
}

#[async_trait]
impl PipelineRunRepository for FakePipelineRunRepository {
    async fn create(&self, run: PipelineRun) -> anyhow::Result<PipelineRun> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(run)
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PipelineRun>> {
        Ok(self.runs.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn get_by_task_id(&self, task_id: Uuid) -> anyhow::Result<Option<PipelineRun>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.task_id == task_id)
            .max_by_key(|r| r.started_at)
            .cloned())
    }

    async fn get_all_by_task_id(&self, task_id: Uuid) -> anyhow::Result<Vec<PipelineRun>> {
        let mut runs: Vec<PipelineRun> = self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect();
        runs.sort_by_key(|r| std::cmp::Reverse(r.started_at));
        Ok(runs)
    }

    async fn update(&self, run: &PipelineRun) -> anyhow::Result<()> {
        let mut runs = self.runs.lock().unwrap();
        if let Some(existing) = runs.iter_mut().find(|r| r.id == run.id) {
            *existing = run.clone();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePipelineStepRunRepository {
    steps: Mutex<Vec<PipelineStepRun>>,
}

impl FakePipelineStepRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, step: PipelineStepRun) {
        self.steps.lock().unwrap().push(step);
    }
}

#[async_trait]
impl PipelineStepRunRepository for FakePipelineStepRunRepository {
    async fn create(&self, step: PipelineStepRun) -> anyhow::Result<PipelineStepRun> {
        self.steps.lock().unwrap().push(step.clone());
        Ok(step)
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<PipelineStepRun>> {
        Ok(self
            .steps
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_by_pipeline_run_id(
        &self,
        pipeline_run_id: Uuid,
    ) -> anyhow::Result<Vec<PipelineStepRun>> {
        let mut steps: Vec<PipelineStepRun> = self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.pipeline_run_id == pipeline_run_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.step_number);
        Ok(steps)
    }

    async fn update(&self, step: &PipelineStepRun) -> anyhow::Result<()> {
        let mut steps = self.steps.lock().unwrap();
        if let Some(existing) = steps.iter_mut().find(|s| s.id == step.id) {
            *existing = step.clone();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAgentRunRepository {
    runs: Mutex<Vec<AgentRun>>,
}

impl FakeAgentRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl AgentRunRepository for FakeAgentRunRepository {
    async fn create(&self, agent_run: AgentRun) -> anyhow::Result<AgentRun> {
        self.runs.lock().unwrap().push(agent_run.clone());
        Ok(agent_run)
    }
}

#[derive(Default)]
pub struct FakeArtifactRepository {
    artifacts: Mutex<Vec<Artifact>>,
}

impl FakeArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.artifacts.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactRepository for FakeArtifactRepository {
    async fn create(&self, artifact: Artifact) -> anyhow::Result<Artifact> {
        self.artifacts.lock().unwrap().push(artifact.clone());
        Ok(artifact)
    }
}

#[derive(Default)]
pub struct FakeDeadLetterEventRepository {
    events: Mutex<Vec<DeadLetterEvent>>,
}

impl FakeDeadLetterEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl DeadLetterEventRepository for FakeDeadLetterEventRepository {
    async fn create(&self, event: DeadLetterEvent) -> anyhow::Result<DeadLetterEvent> {
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }
}

enum BillingMode {
    Normal,
    FailingService,
}

/// In-memory credit ledger. `Normal` mode tracks a real balance per
/// tenant; `FailingService` mode always fails, for exercising the
/// billing-unavailable paths.
pub struct FakeBillingClient {
    balances: Mutex<HashMap<Uuid, Decimal>>,
    mode: BillingMode,
}

impl FakeBillingClient {
    pub fn with_balance(tenant_id: Uuid, balance: Decimal) -> Self {
        let mut balances = HashMap::new();
        balances.insert(tenant_id, balance);
        Self {
            balances: Mutex::new(balances),
            mode: BillingMode::Normal,
        }
    }

    pub fn failing_service(tenant_id: Uuid) -> Self {
        let mut balances = HashMap::new();
        balances.insert(tenant_id, Decimal::ZERO);
        Self {
            balances: Mutex::new(balances),
            mode: BillingMode::FailingService,
        }
    }
}

#[async_trait]
impl BillingClient for FakeBillingClient {
    async fn get_balance(&self, tenant_id: Uuid) -> Result<Decimal, BalanceError> {
        match self.mode {
            BillingMode::FailingService => Err(BalanceError::ServiceUnavailable(
                "simulated billing outage".to_string(),
            )),
            BillingMode::Normal => Ok(*self
                .balances
                .lock()
                .unwrap()
                .get(&tenant_id)
                .unwrap_or(&Decimal::ZERO)),
        }
    }

    async fn consume_credits(
        &self,
        tenant_id: Uuid,
        amount: Decimal,
        _idempotency_key: &str,
        _reference_type: &str,
        _reference_id: Uuid,
        _metadata: Value,
    ) -> Result<(), ConsumeCreditsError> {
        match self.mode {
            BillingMode::FailingService => Err(ConsumeCreditsError::Other(anyhow::anyhow!(
                "billing service unreachable"
            ))),
            BillingMode::Normal => {
                let mut balances = self.balances.lock().unwrap();
                let balance = balances.entry(tenant_id).or_insert(Decimal::ZERO);
                if *balance < amount {
                    return Err(ConsumeCreditsError::InsufficientCredits {
                        balance: *balance,
                        required: amount,
                    });
                }
                *balance -= amount;
                Ok(())
            }
        }
    }
}

/// Always succeeds with canned output, regardless of agent type.
pub struct FakeAgentExecutor;

impl FakeAgentExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeAgentExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentExecutor for FakeAgentExecutor {
    async fn execute(
        &self,
        agent_type: AgentType,
        _inputs: Value,
    ) -> anyhow::Result<AgentExecutionResult> {
        Ok(AgentExecutionResult {
            output: format!("{agent_type} output"),
            model: "fake-model-v1".to_string(),
            prompt_tokens: 100,
            completion_tokens: 200,
            estimated_cost_credits: 10,
        })
    }
}

/// Always fails, for exercising the retry/dead-letter paths.
pub struct FailingAgentExecutor;

#[async_trait]
impl AgentExecutor for FailingAgentExecutor {
    async fn execute(
        &self,
        _agent_type: AgentType,
        _inputs: Value,
    ) -> anyhow::Result<AgentExecutionResult> {
        Err(anyhow::anyhow!("agent crashed"))
    }
}

#[derive(Default)]
pub struct FakeRetryScheduler {
    scheduled: Mutex<Vec<(Uuid, i32)>>,
}

impl FakeRetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn scheduled_count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }
}

#[async_trait]
impl RetryScheduler for FakeRetryScheduler {
    async fn schedule_retry(&self, step_run_id: Uuid, retry_count: i32) -> anyhow::Result<()> {
        self.scheduled
            .lock()
            .unwrap()
            .push((step_run_id, retry_count));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAuditSink {
    events: Mutex<Vec<(String, Uuid, Uuid)>>,
}

impl FakeAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl AuditSink for FakeAuditSink {
    async fn log_event(
        &self,
        event_type: &str,
        tenant_id: Uuid,
        _user_id: Option<Uuid>,
        _resource_type: &str,
        resource_id: Uuid,
        _metadata: Value,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((event_type.to_string(), tenant_id, resource_id));
        Ok(())
    }
}
