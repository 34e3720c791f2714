//! Retry scheduler port (§6).

use async_trait::async_trait;
use uuid::Uuid;

/// Schedules a retry of a failed step attempt. Scheduling strategy
/// (e.g. exponential backoff) is the scheduler's concern; the core
/// only decides *whether* to schedule one.
#[async_trait]
pub trait RetryScheduler: Send + Sync {
    async fn schedule_retry(&self, step_run_id: Uuid, retry_count: i32) -> anyhow::Result<()>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn RetryScheduler) {}
};
