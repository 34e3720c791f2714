//! Demo/local-operation collaborator wiring (§4.7 ambient addition).
//!
//! The billing service, agent runtime, audit log, and retry queue are
//! out of scope for this crate; the CLI still needs something concrete
//! to invoke the use cases against, so it wires test/demo doubles
//! instead of a real network client. None of these are meant to back a
//! production deployment.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use pipeline_core::domain::AgentType;
use pipeline_core::ports::{
    AgentExecutionResult, AgentExecutor, AuditSink, BalanceError, BillingClient,
    ConsumeCreditsError, RetryScheduler,
};

/// The credit balance a tenant starts with when first seen.
const STARTING_BALANCE: Decimal = dec!(500);

/// In-memory credit ledger, seeded lazily per tenant. Not durable across
/// process restarts; a real deployment talks to the billing service.
pub struct InMemoryBillingClient {
    balances: Mutex<HashMap<Uuid, Decimal>>,
    charged: Mutex<std::collections::HashSet<String>>,
}

impl InMemoryBillingClient {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            charged: Mutex::new(std::collections::HashSet::new()),
        }
    }
}

impl Default for InMemoryBillingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingClient for InMemoryBillingClient {
    async fn get_balance(&self, tenant_id: Uuid) -> Result<Decimal, BalanceError> {
        let mut balances = self.balances.lock().expect("billing ledger lock poisoned");
        let balance = *balances.entry(tenant_id).or_insert(STARTING_BALANCE);
        Ok(balance)
    }

    async fn consume_credits(
        &self,
        tenant_id: Uuid,
        amount: Decimal,
        idempotency_key: &str,
        reference_type: &str,
        reference_id: Uuid,
        _metadata: Value,
    ) -> Result<(), ConsumeCreditsError> {
        let mut charged = self.charged.lock().expect("billing ledger lock poisoned");
        if charged.contains(idempotency_key) {
            info!(idempotency_key, "credits already consumed for this key, skipping");
            return Ok(());
        }

        let mut balances = self.balances.lock().expect("billing ledger lock poisoned");
        let balance = balances.entry(tenant_id).or_insert(STARTING_BALANCE);
        if *balance < amount {
            return Err(ConsumeCreditsError::InsufficientCredits {
                balance: *balance,
                required: amount,
            });
        }

        *balance -= amount;
        charged.insert(idempotency_key.to_string());
        info!(
            %tenant_id,
            %amount,
            reference_type,
            %reference_id,
            remaining = %balance,
            "consumed credits"
        );
        Ok(())
    }
}

/// Agent executor that returns a canned response instead of calling a
/// real LLM. Always succeeds.
pub struct CannedAgentExecutor;

#[async_trait]
impl AgentExecutor for CannedAgentExecutor {
    async fn execute(
        &self,
        agent_type: AgentType,
        inputs: Value,
    ) -> anyhow::Result<AgentExecutionResult> {
        info!(%agent_type, "invoking demo agent executor");
        let output = serde_json::json!({
            "agent_type": agent_type.to_string(),
            "echoed_inputs": inputs,
            "note": "canned output from the demo agent executor",
        })
        .to_string();

        Ok(AgentExecutionResult {
            output,
            model: "demo-agent-v1".to_string(),
            prompt_tokens: 256,
            completion_tokens: 512,
            estimated_cost_credits: 0,
        })
    }
}

/// Audit sink that logs events via `tracing` instead of writing to a
/// durable audit log.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log_event(
        &self,
        event_type: &str,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        resource_type: &str,
        resource_id: Uuid,
        metadata: Value,
    ) -> anyhow::Result<()> {
        info!(
            event_type,
            %tenant_id,
            ?user_id,
            resource_type,
            %resource_id,
            %metadata,
            "audit event"
        );
        Ok(())
    }
}

/// Retry scheduler that logs the scheduled retry instead of enqueueing
/// a real job.
pub struct LoggingRetryScheduler;

#[async_trait]
impl RetryScheduler for LoggingRetryScheduler {
    async fn schedule_retry(&self, step_run_id: Uuid, retry_count: i32) -> anyhow::Result<()> {
        warn!(%step_run_id, retry_count, "retry scheduled (demo scheduler, not enqueued)");
        Ok(())
    }
}
