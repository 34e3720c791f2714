//! Structured result carrier for use-case boundaries (§9).
//!
//! Use cases return `Result<T, PipelineError>` rather than propagating
//! `anyhow::Error`: each variant corresponds to one of the stable error
//! code strings surfaced in §6, carrying a human-readable `message` and
//! an optional lower-level `reason` for logs.

use thiserror::Error;

/// The structured error a pipeline use case can return.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{message}")]
    TaskNotFound { message: String },

    #[error("{message}")]
    PipelineNotFound { message: String },

    #[error("{message}")]
    PipelineRunNotFound { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    CannotCancelCompleted { message: String },

    #[error("{message}")]
    PipelineCancelled { message: String },

    #[error("{message}")]
    AgentExecutionFailed {
        message: String,
        reason: Option<String>,
    },

    #[error("{message}")]
    AgentExecutionFailedRetryScheduled {
        message: String,
        reason: Option<String>,
    },

    #[error("{message}")]
    BillingServiceUnavailable {
        message: String,
        reason: Option<String>,
    },

    #[error("{message}")]
    BalanceCheckFailed {
        message: String,
        reason: Option<String>,
    },

    #[error("{message}")]
    ValidationError {
        message: String,
        reason: Option<String>,
    },

    #[error("{message}")]
    PipelineExecutionError {
        message: String,
        reason: Option<String>,
    },
}

impl PipelineError {
    /// The stable error code string surfaced to callers (§6).
    pub fn code(&self) -> &'static str {
        match self {
            Self::TaskNotFound { .. } => "TASK_NOT_FOUND",
            Self::PipelineNotFound { .. } => "PIPELINE_NOT_FOUND",
            Self::PipelineRunNotFound { .. } => "PIPELINE_RUN_NOT_FOUND",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::CannotCancelCompleted { .. } => "CANNOT_CANCEL_COMPLETED",
            Self::PipelineCancelled { .. } => "PIPELINE_CANCELLED",
            Self::AgentExecutionFailed { .. } => "AGENT_EXECUTION_FAILED",
            Self::AgentExecutionFailedRetryScheduled { .. } => {
                "AGENT_EXECUTION_FAILED_RETRY_SCHEDULED"
            }
            Self::BillingServiceUnavailable { .. } => "BILLING_SERVICE_UNAVAILABLE",
            Self::BalanceCheckFailed { .. } => "BALANCE_CHECK_FAILED",
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::PipelineExecutionError { .. } => "PIPELINE_EXECUTION_ERROR",
        }
    }

    /// The `reason` field, if this variant carries one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::AgentExecutionFailed { reason, .. }
            | Self::AgentExecutionFailedRetryScheduled { reason, .. }
            | Self::BillingServiceUnavailable { reason, .. }
            | Self::BalanceCheckFailed { reason, .. }
            | Self::ValidationError { reason, .. }
            | Self::PipelineExecutionError { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn task_not_found(message: impl Into<String>) -> Self {
        Self::TaskNotFound {
            message: message.into(),
        }
    }

    pub fn pipeline_not_found(message: impl Into<String>) -> Self {
        Self::PipelineNotFound {
            message: message.into(),
        }
    }

    pub fn pipeline_run_not_found(message: impl Into<String>) -> Self {
        Self::PipelineRunNotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn cannot_cancel_completed(message: impl Into<String>) -> Self {
        Self::CannotCancelCompleted {
            message: message.into(),
        }
    }

    pub fn pipeline_cancelled(message: impl Into<String>) -> Self {
        Self::PipelineCancelled {
            message: message.into(),
        }
    }

    pub fn agent_execution_failed(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AgentExecutionFailed {
            message: message.into(),
            reason: Some(reason.into()),
        }
    }

    pub fn agent_execution_failed_retry_scheduled(
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::AgentExecutionFailedRetryScheduled {
            message: message.into(),
            reason: Some(reason.into()),
        }
    }

    pub fn billing_service_unavailable(
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BillingServiceUnavailable {
            message: message.into(),
            reason: Some(reason.into()),
        }
    }

    pub fn balance_check_failed(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BalanceCheckFailed {
            message: message.into(),
            reason: Some(reason.into()),
        }
    }

    /// Catch-all mapping for an unclassified failure during *validate*.
    pub fn validation_error(reason: impl Into<String>) -> Self {
        Self::ValidationError {
            message: "An unexpected error occurred during validation".to_string(),
            reason: Some(reason.into()),
        }
    }

    /// Catch-all mapping for an unclassified failure during *run-step*,
    /// *cancel*, or *replay* (§7, class 3).
    pub fn pipeline_execution_error(reason: impl Into<String>) -> Self {
        Self::PipelineExecutionError {
            message: "An unexpected error occurred during pipeline execution".to_string(),
            reason: Some(reason.into()),
        }
    }
}
