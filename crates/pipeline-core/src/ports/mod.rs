//! Collaborator and repository ports (§6): the interfaces use cases are
//! written against. Concrete implementations live in `pipeline-db` (for
//! repositories, against PostgreSQL) or are supplied by the caller (for
//! billing, agent execution, audit, and retry scheduling, which remain
//! out of scope per §1).

pub mod agent_executor;
pub mod audit;
pub mod billing;
pub mod repositories;
pub mod retry;

pub use agent_executor::{AgentExecutionResult, AgentExecutor};
pub use audit::AuditSink;
pub use billing::{BalanceError, BillingClient, ConsumeCreditsError};
pub use repositories::{
    AgentRunRepository, ArtifactRepository, DeadLetterEventRepository, PipelineRunRepository,
    PipelineStepRunRepository, TaskRepository,
};
pub use retry::RetryScheduler;
