use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AgentType;

/// Metadata for one concrete agent call. Created only on agent success;
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
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
