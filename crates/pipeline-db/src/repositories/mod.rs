//! PostgreSQL adapters for the `pipeline-core` repository ports.
//!
//! Each adapter is a thin `PgPool`-holding struct implementing one port
//! trait, using plain `sqlx::query_as` calls, wrapped in a struct so it
//! can be handed to a use case as `Arc<dyn Trait>`.

pub mod agent_runs;
pub mod artifacts;
pub mod dead_letter_events;
pub mod pipeline_runs;
pub mod pipeline_step_runs;
pub mod tasks;

pub use agent_runs::PgAgentRunRepository;
pub use artifacts::PgArtifactRepository;
pub use dead_letter_events::PgDeadLetterEventRepository;
pub use pipeline_runs::PgPipelineRunRepository;
pub use pipeline_step_runs::PgPipelineStepRunRepository;
pub use tasks::PgTaskRepository;
