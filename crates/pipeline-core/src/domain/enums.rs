use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PipelineStatus
// ---------------------------------------------------------------------------

/// Status of a [`super::pipeline_run::PipelineRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl PipelineStatus {
    /// `completed`, `failed`, and `cancelled` accept no further writes
    /// except idempotent audit events.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for PipelineStatus {
    type Err = PipelineStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(PipelineStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PipelineStatus`] string.
#[derive(Debug, Clone)]
pub struct PipelineStatusParseError(pub String);

impl fmt::Display for PipelineStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pipeline status: {:?}", self.0)
    }
}

impl std::error::Error for PipelineStatusParseError {}

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

/// Status of a [`super::pipeline_step_run::PipelineStepRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for StepStatus {
    type Err = StepStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StepStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`StepStatus`] string.
#[derive(Debug, Clone)]
pub struct StepStatusParseError(pub String);

impl fmt::Display for StepStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step status: {:?}", self.0)
    }
}

impl std::error::Error for StepStatusParseError {}

// ---------------------------------------------------------------------------
// StepType
// ---------------------------------------------------------------------------

/// The four fixed pipeline stages, bijective with `step_number ∈ {1..4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Analysis,
    UserStories,
    CodeSkeleton,
    TestCases,
}

impl StepType {
    /// Map a 1-based step number to its step type. Panics on a value
    /// outside `1..=4`; callers only ever pass `current_step`, which the
    /// domain model keeps within that range.
    pub fn from_step_number(step_number: i32) -> Self {
        match step_number {
            1 => Self::Analysis,
            2 => Self::UserStories,
            3 => Self::CodeSkeleton,
            4 => Self::TestCases,
            other => panic!("step number out of range 1..=4: {other}"),
        }
    }

    /// Inverse of [`Self::from_step_number`].
    pub fn step_number(self) -> i32 {
        match self {
            Self::Analysis => 1,
            Self::UserStories => 2,
            Self::CodeSkeleton => 3,
            Self::TestCases => 4,
        }
    }

    /// The agent type invoked for this step.
    pub fn agent_type(self) -> AgentType {
        match self {
            Self::Analysis => AgentType::Architect,
            Self::UserStories => AgentType::Pm,
            Self::CodeSkeleton => AgentType::Engineer,
            Self::TestCases => AgentType::Qa,
        }
    }

    /// Normalized step name as reported by the replay use case
    /// (e.g. `"USER_STORIES"`).
    pub fn normalized_name(self) -> &'static str {
        match self {
            Self::Analysis => "ANALYSIS",
            Self::UserStories => "USER_STORIES",
            Self::CodeSkeleton => "CODE_SKELETON",
            Self::TestCases => "TEST_CASES",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Analysis => "analysis",
            Self::UserStories => "user_stories",
            Self::CodeSkeleton => "code_skeleton",
            Self::TestCases => "test_cases",
        };
        f.write_str(s)
    }
}

impl FromStr for StepType {
    type Err = StepTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(Self::Analysis),
            "user_stories" => Ok(Self::UserStories),
            "code_skeleton" => Ok(Self::CodeSkeleton),
            "test_cases" => Ok(Self::TestCases),
            other => Err(StepTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`StepType`] string.
#[derive(Debug, Clone)]
pub struct StepTypeParseError(pub String);

impl fmt::Display for StepTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step type: {:?}", self.0)
    }
}

impl std::error::Error for StepTypeParseError {}

// ---------------------------------------------------------------------------
// AgentType
// ---------------------------------------------------------------------------

/// The agent role invoked for a given step type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Architect,
    Pm,
    Engineer,
    Qa,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Architect => "architect",
            Self::Pm => "pm",
            Self::Engineer => "engineer",
            Self::Qa => "qa",
        };
        f.write_str(s)
    }
}

impl FromStr for AgentType {
    type Err = AgentTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "architect" => Ok(Self::Architect),
            "pm" => Ok(Self::Pm),
            "engineer" => Ok(Self::Engineer),
            "qa" => Ok(Self::Qa),
            other => Err(AgentTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`AgentType`] string.
#[derive(Debug, Clone)]
pub struct AgentTypeParseError(pub String);

impl fmt::Display for AgentTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid agent type: {:?}", self.0)
    }
}

impl std::error::Error for AgentTypeParseError {}

// ---------------------------------------------------------------------------
// ArtifactStatus
// ---------------------------------------------------------------------------

/// Status of a [`super::artifact::Artifact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Draft,
    Approved,
    Rejected,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl FromStr for ArtifactStatus {
    type Err = ArtifactStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ArtifactStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ArtifactStatus`] string.
#[derive(Debug, Clone)]
pub struct ArtifactStatusParseError(pub String);

impl fmt::Display for ArtifactStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid artifact status: {:?}", self.0)
    }
}

impl std::error::Error for ArtifactStatusParseError {}

// ---------------------------------------------------------------------------
// PauseReason
// ---------------------------------------------------------------------------

/// Reason a [`super::pipeline_run::PipelineRun`] is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    InsufficientCredit,
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientCredit => "insufficient_credit",
        };
        f.write_str(s)
    }
}

impl FromStr for PauseReason {
    type Err = PauseReasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insufficient_credit" => Ok(Self::InsufficientCredit),
            other => Err(PauseReasonParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PauseReason`] string.
#[derive(Debug, Clone)]
pub struct PauseReasonParseError(pub String);

impl fmt::Display for PauseReasonParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pause reason: {:?}", self.0)
    }
}

impl std::error::Error for PauseReasonParseError {}
