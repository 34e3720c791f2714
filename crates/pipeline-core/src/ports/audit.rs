//! Audit sink port (§6).

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Sink for audit events. The core only ever emits
/// `event_type ∈ {"pipeline_cancelled", "pipeline_replayed"}`; failures
/// here must never fail the triggering use case (§5, §7).
#[async_trait]
pub trait AuditSink: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn log_event(
        &self,
        event_type: &str,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        resource_type: &str,
        resource_id: Uuid,
        metadata: Value,
    ) -> anyhow::Result<()>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn AuditSink) {}
};
