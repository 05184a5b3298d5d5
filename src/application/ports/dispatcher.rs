use async_trait::async_trait;

use crate::domain::Job;

/// Matching/dispatch collaborator, notified after a job is created so it
/// can fan the posting out to nearby workers. Out of scope here; the
/// wired implementation only logs.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn job_posted(&self, job: &Job);
}
