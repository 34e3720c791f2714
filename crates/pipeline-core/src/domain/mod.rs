//! The pipeline execution domain model: entities, enums, and the pure
//! invariants and transition helpers that do not require I/O.

pub mod agent_run;
pub mod artifact;
pub mod dead_letter_event;
pub mod enums;
pub mod pipeline_run;
pub mod pipeline_step_run;
pub mod task;

pub use agent_run::AgentRun;
pub use artifact::Artifact;
pub use dead_letter_event::DeadLetterEvent;
pub use enums::{AgentType, ArtifactStatus, PauseReason, PipelineStatus, StepStatus, StepType};
pub use pipeline_run::PipelineRun;
pub use pipeline_step_run::PipelineStepRun;
pub use task::Task;
