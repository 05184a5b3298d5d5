use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::ports::{
    CompleteOutcome, JobStore, LifecycleError, MediaStore, SettingsProvider,
};
use crate::domain::{distance_meters, Assignment, AssignmentStatus, JobId, WorkerId};

const DEFAULT_GPS_RADIUS_METERS: f64 = 150.0;

/// Arrival, start and completion checkpoints for individual assignments.
/// Media uploads run before the store transaction: a failed upload must
/// not leave a committed status transition behind.
pub struct WorkerCheckpointService {
    store: Arc<dyn JobStore>,
    settings: Arc<dyn SettingsProvider>,
    media: Arc<dyn MediaStore>,
}

impl WorkerCheckpointService {
    pub fn new(
        store: Arc<dyn JobStore>,
        settings: Arc<dyn SettingsProvider>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            store,
            settings,
            media,
        }
    }

    #[instrument(skip(self, photo), fields(job_id = %job_id, worker_id = %worker_id))]
    pub async fn arrive(
        &self,
        worker_id: WorkerId,
        job_id: JobId,
        lat: f64,
        long: f64,
        photo: Option<&[u8]>,
    ) -> Result<Assignment, LifecycleError> {
        let job = self
            .store
            .job_by_id(job_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;

        let assignment = self
            .store
            .assignment_for_worker(job_id, worker_id)
            .await?
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("assignment for worker {}", worker_id))
            })?;

        if assignment.status != AssignmentStatus::Accepted {
            return Err(LifecycleError::InvalidState(format!(
                "cannot arrive from status {}",
                assignment.status
            )));
        }

        let distance = distance_meters(job.booking_lat, job.booking_long, lat, long);
        let allowed = self
            .settings
            .get_number("gps_check_radius_meters", DEFAULT_GPS_RADIUS_METERS)
            .await;
        if distance > allowed {
            return Err(LifecycleError::OutOfRange {
                distance_meters: distance,
                allowed_meters: allowed,
            });
        }

        let photo_required = self.settings.get_bool("require_checkin_photo", false).await;
        if photo_required && photo.is_none() {
            return Err(LifecycleError::InvalidState(
                "check-in photo is required".to_string(),
            ));
        }

        let photo_url = match photo {
            Some(bytes) => Some(self.upload(bytes, job_id, "checkin").await?),
            None => None,
        };

        let updated = self.store.mark_arrived(job_id, worker_id, photo_url).await?;
        info!(distance_m = distance, "Worker arrived");
        Ok(updated)
    }

    #[instrument(skip(self), fields(job_id = %job_id, worker_id = %worker_id))]
    pub async fn start(
        &self,
        worker_id: WorkerId,
        job_id: JobId,
    ) -> Result<Assignment, LifecycleError> {
        let assignment = self.store.mark_started(job_id, worker_id).await?;
        info!("Worker started");
        Ok(assignment)
    }

    #[instrument(skip(self, photo), fields(job_id = %job_id, worker_id = %worker_id))]
    pub async fn complete(
        &self,
        worker_id: WorkerId,
        job_id: JobId,
        photo: Option<&[u8]>,
    ) -> Result<CompleteOutcome, LifecycleError> {
        let photo_url = match photo {
            Some(bytes) => Some(self.upload(bytes, job_id, "checkout").await?),
            None => None,
        };

        let outcome = self
            .store
            .mark_completed(job_id, worker_id, photo_url)
            .await?;
        info!(job_completed = outcome.job_completed, "Worker finished");
        Ok(outcome)
    }

    async fn upload(
        &self,
        bytes: &[u8],
        job_id: JobId,
        stage: &str,
    ) -> Result<String, LifecycleError> {
        self.media
            .upload(bytes, &format!("jobs/{}/{}", job_id, stage))
            .await
            .map_err(|e| LifecycleError::Dependency(e.to_string()))
    }
}
