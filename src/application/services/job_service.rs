use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument};

use crate::application::ports::{
    CancelOutcome, JobDispatcher, JobFilter, JobStore, LifecycleError, Page, PageRequest,
    RepositoryError, SettingsProvider,
};
use crate::domain::{Assignment, CustomerId, Job, JobDraft, JobId, TrustActor, WorkerId};

use super::{PricingEngine, TrustScoreService};

const DEFAULT_SEARCHING_TIMEOUT_MINUTES: f64 = 15.0;

/// Job lifecycle orchestration: creation with pricing and auto-expiry,
/// the slot-claim race, cancellation with its trust penalty, and rating.
/// State-dependent mutations are delegated to the store's transactional
/// operations; this layer resolves policy inputs first so no settings
/// read ever happens inside a locked section.
pub struct JobLifecycleService {
    store: Arc<dyn JobStore>,
    trust: Arc<TrustScoreService>,
    pricing: PricingEngine,
    settings: Arc<dyn SettingsProvider>,
    dispatcher: Arc<dyn JobDispatcher>,
}

impl JobLifecycleService {
    pub fn new(
        store: Arc<dyn JobStore>,
        trust: Arc<TrustScoreService>,
        pricing: PricingEngine,
        settings: Arc<dyn SettingsProvider>,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            store,
            trust,
            pricing,
            settings,
            dispatcher,
        }
    }

    #[instrument(skip(self, draft), fields(customer_id = %customer_id))]
    pub async fn create(
        &self,
        customer_id: CustomerId,
        draft: JobDraft,
    ) -> Result<Job, LifecycleError> {
        if self
            .trust
            .is_locked(TrustActor::Customer(customer_id))
            .await?
        {
            return Err(LifecycleError::Unauthorized(
                "customer is temporarily locked by trust score".to_string(),
            ));
        }

        let price = self
            .pricing
            .price(draft.job_type, draft.worker_quantity, draft.estimated_hours)
            .await;

        // Unscheduled ("now") jobs carry an expiry deadline for the
        // external sweeper; scheduled jobs wait for their slot.
        let auto_expire_at = if draft.scheduled_start_time.is_none() {
            let minutes = self
                .settings
                .get_number(
                    "job_searching_timeout_minutes",
                    DEFAULT_SEARCHING_TIMEOUT_MINUTES,
                )
                .await;
            Some(Utc::now() + Duration::minutes(minutes as i64))
        } else {
            None
        };

        let job = Job::from_draft(customer_id, draft, price, auto_expire_at);
        self.store.insert_job(&job).await?;

        info!(job_id = %job.id, price = %job.price_estimated, "Job created");
        self.dispatcher.job_posted(&job).await;

        Ok(job)
    }

    #[instrument(skip(self), fields(job_id = %job_id, worker_id = %worker_id))]
    pub async fn accept(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Assignment, LifecycleError> {
        if self.trust.is_locked(TrustActor::Worker(worker_id)).await? {
            return Err(LifecycleError::Unauthorized(
                "worker is temporarily locked by trust score".to_string(),
            ));
        }

        let assignment = self.store.accept(job_id, worker_id).await?;
        info!(is_leader = assignment.is_leader, "Assignment accepted");
        Ok(assignment)
    }

    #[instrument(skip(self, reason), fields(job_id = %job_id, customer_id = %customer_id))]
    pub async fn cancel(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        reason: &str,
    ) -> Result<CancelOutcome, LifecycleError> {
        let penalties = self.trust.cancel_penalties().await;
        let outcome = self
            .store
            .cancel(job_id, customer_id, reason, penalties)
            .await?;

        info!(
            penalty = %outcome.penalty,
            released = outcome.released_assignments,
            "Job cancelled"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, _comment), fields(job_id = %job_id, customer_id = %customer_id, rating))]
    pub async fn rate_worker(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        rating: u8,
        _comment: Option<&str>,
    ) -> Result<Vec<WorkerId>, LifecycleError> {
        if !(1..=5).contains(&rating) {
            return Err(LifecycleError::InvalidState(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let trust_delta = self.trust.rating_delta(rating).await;
        let rated = self
            .store
            .rate(job_id, customer_id, rating, trust_delta)
            .await?;

        info!(rated_workers = rated.len(), "Rating recorded");
        Ok(rated)
    }

    pub async fn find_all(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> Result<Page<Job>, RepositoryError> {
        self.store.list_jobs(filter, page).await
    }

    pub async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.store.job_by_id(id).await
    }

    pub async fn assignments(&self, job_id: JobId) -> Result<Vec<Assignment>, RepositoryError> {
        self.store.assignments_for_job(job_id).await
    }
}
