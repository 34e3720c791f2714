//! Agent executor port (§6).

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::AgentType;

/// Result of one successful agent invocation.
#[derive(Debug, Clone)]
pub struct AgentExecutionResult {
    pub output: String,
    pub model: String,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub estimated_cost_credits: i32,
}

/// Adapter interface for invoking an LLM coding agent for one pipeline
/// step. Any failure is treated as transient by the run-step
/// orchestrator unless the caller has arranged otherwise; this port
/// does not distinguish failure kinds.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        agent_type: AgentType,
        inputs: Value,
    ) -> anyhow::Result<AgentExecutionResult>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn AgentExecutor) {}
};
