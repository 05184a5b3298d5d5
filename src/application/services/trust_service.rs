use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::application::ports::{
    CancelPenalties, LifecycleError, RepositoryError, SettingsProvider, TrustStore,
};
use crate::domain::{JobId, TrustAction, TrustActor, TrustLedgerEntry, TrustMutation};

const DEFAULT_PENALTY_CANCEL_SEARCHING: f64 = -0.02;
const DEFAULT_PENALTY_CANCEL_LOCKED: f64 = -0.07;
const DEFAULT_REWARD_RATING_5: f64 = 0.05;
const DEFAULT_REWARD_RATING_4: f64 = 0.02;
const DEFAULT_PENALTY_RATING_2: f64 = -0.05;
const DEFAULT_PENALTY_RATING_1: f64 = -0.10;

/// Policy front-end over the trust store: resolves penalty and reward
/// magnitudes from settings and exposes the delta/lock operations.
pub struct TrustScoreService {
    store: Arc<dyn TrustStore>,
    settings: Arc<dyn SettingsProvider>,
}

impl TrustScoreService {
    pub fn new(store: Arc<dyn TrustStore>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self { store, settings }
    }

    #[instrument(skip(self), fields(actor = %actor, action = %action.as_str()))]
    pub async fn apply_delta(
        &self,
        actor: TrustActor,
        delta: Decimal,
        action: TrustAction,
        job_id: Option<JobId>,
        reason: &str,
    ) -> Result<TrustMutation, LifecycleError> {
        self.store
            .apply_delta(actor, delta, action, job_id, reason)
            .await
    }

    pub async fn is_locked(&self, actor: TrustActor) -> Result<bool, RepositoryError> {
        self.store.is_locked(actor).await
    }

    pub async fn score(&self, actor: TrustActor) -> Result<Option<Decimal>, RepositoryError> {
        self.store.score(actor).await
    }

    pub async fn ledger(
        &self,
        actor: TrustActor,
    ) -> Result<Vec<TrustLedgerEntry>, RepositoryError> {
        self.store.ledger(actor).await
    }

    /// Cancellation tiers: the later the job had progressed, the larger
    /// the penalty.
    pub async fn cancel_penalties(&self) -> CancelPenalties {
        let searching = self
            .settings
            .get_number(
                "trust_penalty_cancel_searching",
                DEFAULT_PENALTY_CANCEL_SEARCHING,
            )
            .await;
        let locked = self
            .settings
            .get_number("trust_penalty_cancel_locked", DEFAULT_PENALTY_CANCEL_LOCKED)
            .await;

        CancelPenalties {
            searching: Decimal::from_f64(searching).unwrap_or_default().round_dp(2),
            locked: Decimal::from_f64(locked).unwrap_or_default().round_dp(2),
        }
    }

    /// Ratings below 3 stars penalize, 4-5 reward, 3 is neutral.
    pub async fn rating_delta(&self, rating: u8) -> Decimal {
        let raw = match rating {
            5 => {
                self.settings
                    .get_number("trust_reward_rating_5", DEFAULT_REWARD_RATING_5)
                    .await
            }
            4 => {
                self.settings
                    .get_number("trust_reward_rating_4", DEFAULT_REWARD_RATING_4)
                    .await
            }
            2 => {
                self.settings
                    .get_number("trust_penalty_rating_2", DEFAULT_PENALTY_RATING_2)
                    .await
            }
            1 => {
                self.settings
                    .get_number("trust_penalty_rating_1", DEFAULT_PENALTY_RATING_1)
                    .await
            }
            _ => 0.0,
        };

        Decimal::from_f64(raw).unwrap_or_default().round_dp(2)
    }
}
