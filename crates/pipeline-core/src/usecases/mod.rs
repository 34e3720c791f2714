//! The four pipeline use cases (§4): Validate, Run-Step, Cancel, and
//! Replay. Each is a small struct holding `Arc<dyn ...>` port handles
//! plus a [`crate::clock::Clock`], with one `execute` entry point.

pub mod cancel;
pub mod replay;
pub mod run_step;
pub mod validate;

pub use cancel::{CancelPipeline, CancelPipelineCommand, CancelResult};
pub use replay::{ReplayPipeline, ReplayPipelineCommand, ReplayResult};
pub use run_step::{RunPipelineStep, RunStepCommand, RunStepResult, RunStepStatus};
pub use validate::{ValidatePipeline, ValidatePipelineCommand, ValidationResult};
