use async_trait::async_trait;
use tracing::info;

use crate::application::ports::JobDispatcher;
use crate::domain::Job;

/// Placeholder dispatch that only announces new postings in the log.
#[derive(Default)]
pub struct LogDispatcher;

impl LogDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobDispatcher for LogDispatcher {
    async fn job_posted(&self, job: &Job) {
        info!(
            job_id = %job.id,
            job_type = %job.job_type.as_str(),
            workers = job.worker_quantity,
            "job posted, awaiting workers"
        );
    }
}
