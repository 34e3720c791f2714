use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use super::enums::StepStatus;
use super::enums::StepType;

/// Default retry cap for a step attempt (`AC-2.5`).
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// One attempted execution of one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStepRun {
    pub id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_number: i32,
    pub step_type: StepType,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    /// Immutable once written (§3): the frozen input the agent saw.
    pub input_snapshot: Option<Value>,
}

impl PipelineStepRun {
    /// Construct a fresh attempt at `step_number`, `status = running`.
    pub fn new_running(id: Uuid, pipeline_run_id: Uuid, step_number: i32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            pipeline_run_id,
            step_number,
            step_type: StepType::from_step_number(step_number),
            status: StepStatus::Running,
            started_at: Some(now),
            completed_at: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            input_snapshot: None,
        }
    }

    /// Whether another attempt may be scheduled for this step.
    pub fn is_retryable(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Mark this attempt `completed`.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(now);
    }

    /// Mark this attempt `failed`.
    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::Failed;
        self.completed_at = Some(now);
    }

    /// Mark this attempt `cancelled`.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::Cancelled;
        self.completed_at = Some(now);
    }

    /// Resume a `pending` retry attempt as `running`, keeping the same
    /// id and `retry_count` so the idempotency key carries over.
    pub fn resume_for_retry(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::Running;
        self.started_at = Some(now);
    }

    /// Reset to `pending` for a scheduled retry, incrementing the counter.
    pub fn reset_for_retry(&mut self) {
        self.retry_count += 1;
        self.status = StepStatus::Pending;
        self.completed_at = None;
    }

    /// The idempotency key this attempt bills under (§4.2 step 12).
    pub fn idempotency_key(&self) -> String {
        if self.retry_count > 0 {
            format!(
                "{}:{}:retry_{}",
                self.pipeline_run_id, self.id, self.retry_count
            )
        } else {
            format!("{}:{}", self.pipeline_run_id, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> PipelineStepRun {
        PipelineStepRun::new_running(Uuid::new_v4(), Uuid::new_v4(), 2, now)
    }

    #[test]
    fn new_running_derives_step_type_from_number() {
        let now = Utc::now();
        let step = sample(now);
        assert_eq!(step.step_type, StepType::UserStories);
        assert_eq!(step.retry_count, 0);
        assert_eq!(step.max_retries, DEFAULT_MAX_RETRIES);
        assert!(step.input_snapshot.is_none());
    }

    #[test]
    fn idempotency_key_changes_with_retry_count() {
        let now = Utc::now();
        let mut step = sample(now);
        let first_key = step.idempotency_key();
        assert_eq!(
            first_key,
            format!("{}:{}", step.pipeline_run_id, step.id)
        );

        step.fail(now);
        step.reset_for_retry();
        let retry_key = step.idempotency_key();
        assert_eq!(
            retry_key,
            format!("{}:{}:retry_1", step.pipeline_run_id, step.id)
        );
        assert_ne!(first_key, retry_key);
    }

    #[test]
    fn retry_exhaustion() {
        let now = Utc::now();
        let mut step = sample(now);
        assert!(step.is_retryable());
        step.retry_count = DEFAULT_MAX_RETRIES;
        assert!(!step.is_retryable());
    }

    #[test]
    fn complete_requires_completed_at() {
        let now = Utc::now();
        let mut step = sample(now);
        step.complete(now);
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.completed_at, Some(now));
    }
}
