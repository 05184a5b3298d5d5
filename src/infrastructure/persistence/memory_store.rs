use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{
    CancelOutcome, CancelPenalties, CompleteOutcome, JobFilter, JobSort, JobStore, LifecycleError,
    Page, PageRequest, RepositoryError, TrustStore,
};
use crate::domain::{
    Assignment, AssignmentStatus, CustomerId, Job, JobId, JobStatus, TrustAction, TrustActor,
    TrustLedgerEntry, TrustMutation, TrustPolicy, WorkerId,
};

#[derive(Debug, Clone)]
struct ActorRecord {
    score: Decimal,
    locked_until: Option<DateTime<Utc>>,
    rating_avg: Decimal,
    rating_count: u32,
}

impl Default for ActorRecord {
    fn default() -> Self {
        Self {
            score: Decimal::from(5),
            locked_until: None,
            rating_avg: Decimal::from(5),
            rating_count: 0,
        }
    }
}

#[derive(Default)]
struct MemState {
    jobs: HashMap<JobId, Job>,
    assignments: Vec<Assignment>,
    actors: HashMap<TrustActor, ActorRecord>,
    ledger: Vec<TrustLedgerEntry>,
}

/// In-memory implementation of the durable stores. One mutex guards the
/// whole state, so every transition method is trivially atomic and
/// serialized — the same linearization the Postgres adapter gets from
/// row locks. Used by tests and local development.
pub struct InMemoryStore {
    state: Mutex<MemState>,
    policy: TrustPolicy,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(TrustPolicy::default())
    }
}

impl InMemoryStore {
    pub fn new(policy: TrustPolicy) -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            policy,
        }
    }
}

impl MemState {
    fn active_slots(&self, job_id: JobId) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.job_id == job_id && a.status.occupies_slot())
            .count()
    }

    fn apply_trust(
        &mut self,
        policy: &TrustPolicy,
        actor: TrustActor,
        delta: Decimal,
        action: TrustAction,
        job_id: Option<JobId>,
        reason: &str,
    ) -> TrustMutation {
        let now = Utc::now();
        let record = self.actors.entry(actor).or_default();
        let mutation = policy.apply(record.score, delta, record.locked_until, now);
        record.score = mutation.new_score;
        record.locked_until = mutation.locked_until;

        self.ledger.push(TrustLedgerEntry {
            id: Uuid::new_v4(),
            actor,
            job_id,
            action,
            change_amount: delta,
            old_score: mutation.old_score,
            new_score: mutation.new_score,
            description: reason.to_string(),
            created_at: now,
        });

        mutation
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.jobs.contains_key(&job.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "duplicate job id {}",
                job.id
            )));
        }
        state.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn job_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&id).cloned())
    }

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> Result<Page<Job>, RepositoryError> {
        let state = self.state.lock().await;

        let mut matched: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| {
                filter.status.is_none_or(|s| job.status == s)
                    && filter.job_type.is_none_or(|t| job.job_type == t)
                    && filter.search.as_deref().is_none_or(|needle| {
                        let needle = needle.to_lowercase();
                        job.description_text
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                            || job
                                .booking_address_text
                                .as_deref()
                                .is_some_and(|a| a.to_lowercase().contains(&needle))
                    })
            })
            .cloned()
            .collect();

        match filter.sort {
            JobSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            JobSort::Oldest => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            JobSort::PriceHigh => matched.sort_by(|a, b| b.price_estimated.cmp(&a.price_estimated)),
            JobSort::PriceLow => matched.sort_by(|a, b| a.price_estimated.cmp(&b.price_estimated)),
        }

        let total_items = matched.len() as u64;
        let limit = page.limit.max(1);
        let total_pages = total_items.div_ceil(limit as u64) as u32;
        let offset = ((page.page.max(1) - 1) * limit) as usize;
        let data = matched
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok(Page {
            data,
            page: page.page.max(1),
            limit,
            total_items,
            total_pages,
        })
    }

    async fn assignments_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn assignment_for_worker(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Option<Assignment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .find(|a| a.job_id == job_id && a.worker_id == worker_id)
            .cloned())
    }

    async fn accept(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Assignment, LifecycleError> {
        let mut state = self.state.lock().await;

        let job = state
            .jobs
            .get(&job_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;
        if job.status != JobStatus::Searching {
            return Err(LifecycleError::InvalidState(format!(
                "job is {}, not accepting workers",
                job.status
            )));
        }
        let worker_quantity = job.worker_quantity;

        if state
            .assignments
            .iter()
            .any(|a| a.job_id == job_id && a.worker_id == worker_id)
        {
            return Err(LifecycleError::AlreadyAssigned);
        }

        let active = state.active_slots(job_id);
        if active >= worker_quantity as usize {
            // Status lagged reality; self-heal before rejecting.
            if let Some(job) = state.jobs.get_mut(&job_id) {
                job.status = JobStatus::Locked;
                job.updated_at = Utc::now();
            }
            return Err(LifecycleError::CapacityExceeded);
        }

        let assignment = Assignment::accepted(job_id, worker_id, active == 0);
        state.assignments.push(assignment.clone());

        if active + 1 == worker_quantity as usize {
            if let Some(job) = state.jobs.get_mut(&job_id) {
                job.status = JobStatus::Locked;
                job.updated_at = Utc::now();
            }
        }

        Ok(assignment)
    }

    async fn cancel(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        reason: &str,
        penalties: CancelPenalties,
    ) -> Result<CancelOutcome, LifecycleError> {
        let mut state = self.state.lock().await;

        let job = state
            .jobs
            .get(&job_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;
        if job.customer_id != customer_id {
            return Err(LifecycleError::Unauthorized(
                "job belongs to another customer".to_string(),
            ));
        }
        if !job.status.is_cancellable() {
            return Err(LifecycleError::InvalidState(format!(
                "cannot cancel a job in status {}",
                job.status
            )));
        }

        let (penalty, action) = match job.status {
            JobStatus::Searching => (penalties.searching, TrustAction::CancelSearching),
            JobStatus::Locked => (penalties.locked, TrustAction::CancelLocked),
            _ => unreachable!("is_cancellable covers the remaining states"),
        };
        let old_status = job.status;

        let now = Utc::now();
        if let Some(job) = state.jobs.get_mut(&job_id) {
            job.status = JobStatus::Cancelled;
            job.cancel_reason = Some(reason.to_string());
            job.updated_at = now;
        }

        let mut released = 0;
        for assignment in state
            .assignments
            .iter_mut()
            .filter(|a| a.job_id == job_id && a.status != AssignmentStatus::Cancelled)
        {
            assignment.status = AssignmentStatus::Cancelled;
            assignment.updated_at = now;
            released += 1;
        }

        let trust = if !penalty.is_zero() {
            Some(state.apply_trust(
                &self.policy,
                TrustActor::Customer(customer_id),
                penalty,
                action,
                Some(job_id),
                &format!("cancelled while {}", old_status),
            ))
        } else {
            None
        };

        Ok(CancelOutcome {
            penalty,
            trust,
            released_assignments: released,
        })
    }

    async fn rate(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        rating: u8,
        trust_delta: Decimal,
    ) -> Result<Vec<WorkerId>, LifecycleError> {
        let mut state = self.state.lock().await;

        let job = state
            .jobs
            .get(&job_id)
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;
        if job.customer_id != customer_id {
            return Err(LifecycleError::Unauthorized(
                "job belongs to another customer".to_string(),
            ));
        }
        if job.status != JobStatus::Completed {
            return Err(LifecycleError::InvalidState(format!(
                "only completed jobs can be rated, job is {}",
                job.status
            )));
        }

        let workers: Vec<WorkerId> = state
            .assignments
            .iter()
            .filter(|a| a.job_id == job_id && a.status != AssignmentStatus::Cancelled)
            .map(|a| a.worker_id)
            .collect();
        if workers.is_empty() {
            return Err(LifecycleError::NotFound(
                "no workers to rate on this job".to_string(),
            ));
        }

        for worker_id in &workers {
            let record = state
                .actors
                .entry(TrustActor::Worker(*worker_id))
                .or_default();
            let count = Decimal::from(record.rating_count);
            let new_avg = ((record.rating_avg * count + Decimal::from(rating))
                / (count + Decimal::ONE))
                .round_dp(1);
            record.rating_avg = new_avg;
            record.rating_count += 1;

            if !trust_delta.is_zero() {
                state.apply_trust(
                    &self.policy,
                    TrustActor::Worker(*worker_id),
                    trust_delta,
                    TrustAction::RatingReceived,
                    Some(job_id),
                    &format!("{} star rating", rating),
                );
            }
        }

        Ok(workers)
    }

    async fn mark_arrived(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        photo_url: Option<String>,
    ) -> Result<Assignment, LifecycleError> {
        let mut state = self.state.lock().await;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.job_id == job_id && a.worker_id == worker_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("assignment for worker {}", worker_id))
            })?;

        if assignment.status != AssignmentStatus::Accepted {
            return Err(LifecycleError::InvalidState(format!(
                "cannot arrive from status {}",
                assignment.status
            )));
        }

        let now = Utc::now();
        assignment.status = AssignmentStatus::Arrived;
        assignment.arrived_at = Some(now);
        assignment.check_in_photo_url = photo_url;
        assignment.updated_at = now;

        Ok(assignment.clone())
    }

    async fn mark_started(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Assignment, LifecycleError> {
        let mut state = self.state.lock().await;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.job_id == job_id && a.worker_id == worker_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("assignment for worker {}", worker_id))
            })?;

        if assignment.status != AssignmentStatus::Arrived {
            return Err(LifecycleError::InvalidState(format!(
                "cannot start from status {}",
                assignment.status
            )));
        }

        let now = Utc::now();
        assignment.status = AssignmentStatus::InProgress;
        assignment.started_at = Some(now);
        assignment.updated_at = now;
        let updated = assignment.clone();

        // First start moves the job forward; terminal states never regress.
        if let Some(job) = state.jobs.get_mut(&job_id) {
            if matches!(job.status, JobStatus::Searching | JobStatus::Locked) {
                job.status = JobStatus::InProgress;
                job.updated_at = now;
            }
        }

        Ok(updated)
    }

    async fn mark_completed(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        photo_url: Option<String>,
    ) -> Result<CompleteOutcome, LifecycleError> {
        let mut state = self.state.lock().await;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.job_id == job_id && a.worker_id == worker_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("assignment for worker {}", worker_id))
            })?;

        if assignment.status != AssignmentStatus::InProgress {
            return Err(LifecycleError::InvalidState(format!(
                "cannot complete from status {}",
                assignment.status
            )));
        }

        let now = Utc::now();
        assignment.status = AssignmentStatus::Done;
        assignment.finished_at = Some(now);
        assignment.check_out_photo_url = photo_url;
        assignment.updated_at = now;
        let updated = assignment.clone();

        // Rollup over the post-update row set.
        let total = state
            .assignments
            .iter()
            .filter(|a| a.job_id == job_id && a.status != AssignmentStatus::Cancelled)
            .count();
        let done = state
            .assignments
            .iter()
            .filter(|a| a.job_id == job_id && a.status == AssignmentStatus::Done)
            .count();

        let job_completed = done == total;
        if job_completed {
            if let Some(job) = state.jobs.get_mut(&job_id) {
                job.status = JobStatus::Completed;
                job.final_price = job.price_estimated;
                job.updated_at = now;

                let earning = (job.final_price / Decimal::from(done as u32)).round_dp(2);
                for a in state
                    .assignments
                    .iter_mut()
                    .filter(|a| a.job_id == job_id && a.status == AssignmentStatus::Done)
                {
                    a.earning_amount = Some(earning);
                }
            }
        }

        Ok(CompleteOutcome {
            assignment: updated,
            job_completed,
        })
    }
}

#[async_trait]
impl TrustStore for InMemoryStore {
    async fn apply_delta(
        &self,
        actor: TrustActor,
        delta: Decimal,
        action: TrustAction,
        job_id: Option<JobId>,
        reason: &str,
    ) -> Result<TrustMutation, LifecycleError> {
        let mut state = self.state.lock().await;
        Ok(state.apply_trust(&self.policy, actor, delta, action, job_id, reason))
    }

    async fn is_locked(&self, actor: TrustActor) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .actors
            .get(&actor)
            .and_then(|r| r.locked_until)
            .is_some_and(|until| until > Utc::now()))
    }

    async fn score(&self, actor: TrustActor) -> Result<Option<Decimal>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(Some(
            state
                .actors
                .get(&actor)
                .map(|r| r.score)
                .unwrap_or_else(|| Decimal::from(5)),
        ))
    }

    async fn ledger(&self, actor: TrustActor) -> Result<Vec<TrustLedgerEntry>, RepositoryError> {
        let state = self.state.lock().await;
        let mut entries: Vec<TrustLedgerEntry> = state
            .ledger
            .iter()
            .filter(|e| e.actor == actor)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }
}
