use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{
    Assignment, CustomerId, Job, JobId, JobStatus, JobType, TrustMutation, WorkerId,
};

use super::{LifecycleError, RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSort {
    #[default]
    Newest,
    Oldest,
    PriceHigh,
    PriceLow,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
    /// Matched against description text and booking address.
    pub search: Option<String>,
    pub sort: JobSort,
}

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Status-tiered penalties for customer cancellation, resolved from
/// settings before the transaction opens; the store picks the tier from
/// the job status it observes under lock.
#[derive(Debug, Clone, Copy)]
pub struct CancelPenalties {
    pub searching: Decimal,
    pub locked: Decimal,
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub penalty: Decimal,
    pub trust: Option<TrustMutation>,
    pub released_assignments: usize,
}

#[derive(Debug, Clone)]
pub struct CompleteOutcome {
    pub assignment: Assignment,
    /// True when this worker was the last outstanding one and the job
    /// flipped to completed in the same transaction.
    pub job_completed: bool,
}

/// Durable job + assignment store. The transition methods are each one
/// atomic unit: they take an exclusive lock on the job row, re-validate
/// state under that lock, and commit every effect or none. Concurrent
/// calls against the same job are linearized by that lock.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn job_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> Result<Page<Job>, RepositoryError>;

    async fn assignments_for_job(&self, job_id: JobId)
        -> Result<Vec<Assignment>, RepositoryError>;

    async fn assignment_for_worker(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Option<Assignment>, RepositoryError>;

    /// Race-critical slot claim. Fails with `NotFound`, `InvalidState`
    /// (job not searching), `AlreadyAssigned` or `CapacityExceeded`; on
    /// the capacity path the job is self-healed to locked. The first
    /// accepted worker becomes leader, the Nth accept locks the job.
    async fn accept(&self, job_id: JobId, worker_id: WorkerId)
        -> Result<Assignment, LifecycleError>;

    /// Customer cancellation: ownership check, status gate, cascade to
    /// assignments, trust penalty + ledger append, all in one
    /// transaction. A zero tier penalty skips the trust mutation.
    async fn cancel(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        reason: &str,
        penalties: CancelPenalties,
    ) -> Result<CancelOutcome, LifecycleError>;

    /// Applies the customer's rating to every worker assigned to the
    /// completed job: incremental mean on the worker record, plus the
    /// tiered trust delta when it is non-zero.
    async fn rate(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        rating: u8,
        trust_delta: Decimal,
    ) -> Result<Vec<WorkerId>, LifecycleError>;

    /// accepted -> arrived. The GPS gate runs in the service before this
    /// is called; the state precondition is re-checked under lock.
    async fn mark_arrived(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        photo_url: Option<String>,
    ) -> Result<Assignment, LifecycleError>;

    /// arrived -> in_progress; flips the job locked -> in_progress on
    /// the first start, never regressing a terminal job.
    async fn mark_started(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Assignment, LifecycleError>;

    /// in_progress -> done; counts the post-update row set under the job
    /// lock and completes the job when every assignment is done, stamping
    /// final price and per-worker earnings.
    async fn mark_completed(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        photo_url: Option<String>,
    ) -> Result<CompleteOutcome, LifecycleError>;
}
