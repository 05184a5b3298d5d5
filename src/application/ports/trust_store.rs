use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{JobId, TrustAction, TrustActor, TrustLedgerEntry, TrustMutation};

use super::{LifecycleError, RepositoryError};

/// Bounded reputation ledger. `apply_delta` locks the actor row, clamps
/// and rounds the score, maintains the lock-until timestamp and appends
/// the audit entry as one atomic unit.
#[async_trait]
pub trait TrustStore: Send + Sync {
    async fn apply_delta(
        &self,
        actor: TrustActor,
        delta: Decimal,
        action: TrustAction,
        job_id: Option<JobId>,
        reason: &str,
    ) -> Result<TrustMutation, LifecycleError>;

    /// Pure read: true iff a lock timestamp exists and is still in the
    /// future.
    async fn is_locked(&self, actor: TrustActor) -> Result<bool, RepositoryError>;

    async fn score(&self, actor: TrustActor) -> Result<Option<Decimal>, RepositoryError>;

    /// Audit entries for one actor, newest first.
    async fn ledger(&self, actor: TrustActor) -> Result<Vec<TrustLedgerEntry>, RepositoryError>;
}
