use std::sync::Arc;

use crate::application::services::{
    JobLifecycleService, LocationRelay, TrustScoreService, WorkerCheckpointService,
};

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobLifecycleService>,
    pub checkpoints: Arc<WorkerCheckpointService>,
    pub trust: Arc<TrustScoreService>,
    pub relay: Arc<LocationRelay>,
}
