use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PauseReason;
pub use super::enums::PipelineStatus;

/// The per-task execution record driving a pipeline through its four
/// steps. See [`crate::domain`] for the invariants this type upholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub task_id: Uuid,
    pub tenant_id: Uuid,
    pub status: PipelineStatus,
    pub current_step: i32,
    pub pause_reasons: HashSet<PauseReason>,
    pub pause_expires_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineRun {
    /// Construct a fresh, running run at step 1 for a task, as created by
    /// the first successful run-step invocation.
    pub fn new_running(id: Uuid, task_id: Uuid, tenant_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            task_id,
            tenant_id,
            status: PipelineStatus::Running,
            current_step: 1,
            pause_reasons: HashSet::new(),
            pause_expires_at: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Whether this run accepts no further mutating writes.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Advance `current_step` by one, capped at 4, and bump `updated_at`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        if self.current_step < 4 {
            self.current_step += 1;
        }
        self.updated_at = now;
    }

    /// Transition into a week-long insufficient-credit pause.
    pub fn pause_for_insufficient_credit(&mut self, now: DateTime<Utc>) {
        self.status = PipelineStatus::Paused;
        self.pause_reasons.insert(PauseReason::InsufficientCredit);
        self.pause_expires_at = Some(now + chrono::Duration::days(7));
        self.updated_at = now;
    }

    /// Transition into `cancelled`.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = PipelineStatus::Cancelled;
        self.updated_at = now;
    }

    /// Transition into `failed`, e.g. after retries are exhausted and a
    /// dead-letter event has been recorded.
    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.status = PipelineStatus::Failed;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> PipelineRun {
        PipelineRun::new_running(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), now)
    }

    #[test]
    fn new_running_starts_at_step_one() {
        let now = Utc::now();
        let run = sample(now);
        assert_eq!(run.status, PipelineStatus::Running);
        assert_eq!(run.current_step, 1);
        assert!(run.pause_reasons.is_empty());
        assert!(!run.is_terminal());
    }

    #[test]
    fn advance_caps_at_four() {
        let now = Utc::now();
        let mut run = sample(now);
        for expected in [2, 3, 4, 4, 4] {
            run.advance(now);
            assert_eq!(run.current_step, expected);
        }
    }

    #[test]
    fn pause_sets_reason_and_expiry() {
        let now = Utc::now();
        let mut run = sample(now);
        run.pause_for_insufficient_credit(now);
        assert_eq!(run.status, PipelineStatus::Paused);
        assert!(run.pause_reasons.contains(&PauseReason::InsufficientCredit));
        assert_eq!(run.pause_expires_at, Some(now + chrono::Duration::days(7)));
    }

    #[test]
    fn terminal_statuses() {
        let now = Utc::now();
        let mut run = sample(now);
        run.cancel(now);
        assert!(run.is_terminal());

        let mut run = sample(now);
        run.fail(now);
        assert!(run.is_terminal());
    }
}
