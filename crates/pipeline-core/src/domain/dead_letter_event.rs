use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A durable record of a step that exhausted its retries, deposited for
/// operator follow-up. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEvent {
    pub id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_run_id: Uuid,
    pub failure_reason: String,
    pub retry_count: i32,
    pub context: Value,
    pub created_at: DateTime<Utc>,
}
