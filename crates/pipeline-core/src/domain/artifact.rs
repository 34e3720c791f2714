use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use super::enums::ArtifactStatus;
use super::enums::StepType;

/// The persisted output of a successful step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub task_id: Uuid,
    pub pipeline_run_id: Uuid,
    pub step_run_id: Uuid,
    pub artifact_type: StepType,
    pub status: ArtifactStatus,
    pub content: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Artifact {
    /// Construct the artifact for a freshly completed step, applying the
    /// draft/approved policy of §3: `ANALYSIS` is auto-approved, every
    /// other step type starts as `draft`.
    pub fn new_for_step(
        id: Uuid,
        task_id: Uuid,
        pipeline_run_id: Uuid,
        step_run_id: Uuid,
        step_type: StepType,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        let status = if step_type == StepType::Analysis {
            ArtifactStatus::Approved
        } else {
            ArtifactStatus::Draft
        };
        let approved_at = (status == ArtifactStatus::Approved).then_some(now);

        Self {
            id,
            task_id,
            pipeline_run_id,
            step_run_id,
            artifact_type: step_type,
            status,
            content,
            version: 1,
            created_at: now,
            updated_at: now,
            approved_at,
        }
    }
}
