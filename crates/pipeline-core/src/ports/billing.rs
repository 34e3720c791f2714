//! Billing client port (§6).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Failure modes of [`BillingClient::get_balance`].
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("billing service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure modes of [`BillingClient::consume_credits`].
#[derive(Debug, Error)]
pub enum ConsumeCreditsError {
    #[error("insufficient credits: balance {balance} is below required {required}")]
    InsufficientCredits { balance: Decimal, required: Decimal },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Client for the tenant credit ledger.
#[async_trait]
pub trait BillingClient: Send + Sync {
    /// Current credit balance for a tenant.
    async fn get_balance(&self, tenant_id: Uuid) -> Result<Decimal, BalanceError>;

    /// Charge a tenant. Implementations must be idempotent by
    /// `idempotency_key`: replaying the same key must not charge twice.
    #[allow(clippy::too_many_arguments)]
    async fn consume_credits(
        &self,
        tenant_id: Uuid,
        amount: Decimal,
        idempotency_key: &str,
        reference_type: &str,
        reference_id: Uuid,
        metadata: Value,
    ) -> Result<(), ConsumeCreditsError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn BillingClient) {}
};
