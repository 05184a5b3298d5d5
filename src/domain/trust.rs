use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{CustomerId, JobId, WorkerId};

/// Trust scores apply symmetrically to both sides of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustActor {
    Customer(CustomerId),
    Worker(WorkerId),
}

impl TrustActor {
    pub fn kind(&self) -> &'static str {
        match self {
            TrustActor::Customer(_) => "customer",
            TrustActor::Worker(_) => "worker",
        }
    }

    pub fn as_uuid(&self) -> Uuid {
        match self {
            TrustActor::Customer(id) => id.as_uuid(),
            TrustActor::Worker(id) => id.as_uuid(),
        }
    }
}

impl std::fmt::Display for TrustActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.as_uuid())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustAction {
    CancelSearching,
    CancelLocked,
    JobCompleted,
    RatingReceived,
    NoShow,
    ManualAdjustment,
}

impl TrustAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustAction::CancelSearching => "cancel_searching",
            TrustAction::CancelLocked => "cancel_locked",
            TrustAction::JobCompleted => "job_completed",
            TrustAction::RatingReceived => "rating_received",
            TrustAction::NoShow => "no_show",
            TrustAction::ManualAdjustment => "manual_adjustment",
        }
    }
}

impl std::str::FromStr for TrustAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel_searching" => Ok(TrustAction::CancelSearching),
            "cancel_locked" => Ok(TrustAction::CancelLocked),
            "job_completed" => Ok(TrustAction::JobCompleted),
            "rating_received" => Ok(TrustAction::RatingReceived),
            "no_show" => Ok(TrustAction::NoShow),
            "manual_adjustment" => Ok(TrustAction::ManualAdjustment),
            _ => Err(format!("Invalid trust action: {}", s)),
        }
    }
}

/// Bounds and lock rule for the trust accumulator. Penalty and reward
/// magnitudes live in system settings; these are the structural limits.
#[derive(Debug, Clone, Copy)]
pub struct TrustPolicy {
    pub min_score: Decimal,
    pub max_score: Decimal,
    pub lock_threshold: Decimal,
    pub lock_duration_hours: i64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            min_score: Decimal::ZERO,
            max_score: Decimal::from(5),
            lock_threshold: Decimal::from(2),
            lock_duration_hours: 48,
        }
    }
}

/// Outcome of applying one delta under a policy. Pure; shared by every
/// store backend so clamping and lock handling cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustMutation {
    pub old_score: Decimal,
    pub new_score: Decimal,
    pub locked_until: Option<DateTime<Utc>>,
}

impl TrustPolicy {
    pub fn apply(
        &self,
        current: Decimal,
        delta: Decimal,
        existing_lock: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> TrustMutation {
        let new_score = (current + delta)
            .clamp(self.min_score, self.max_score)
            .round_dp(2);

        let locked_until = if new_score < self.lock_threshold {
            Some(now + Duration::hours(self.lock_duration_hours))
        } else {
            // Recovering to/above the threshold clears an existing lock.
            let _ = existing_lock;
            None
        };

        TrustMutation {
            old_score: current,
            new_score,
            locked_until,
        }
    }
}

/// Append-only audit record, written in the same transaction as the
/// actor's score mutation.
#[derive(Debug, Clone)]
pub struct TrustLedgerEntry {
    pub id: Uuid,
    pub actor: TrustActor,
    pub job_id: Option<JobId>,
    pub action: TrustAction,
    pub change_amount: Decimal,
    pub old_score: Decimal,
    pub new_score: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
