#![allow(dead_code)]

use std::sync::Arc;

use quickcrew::application::services::{
    JobLifecycleService, PricingEngine, TrustScoreService, WorkerCheckpointService,
};
use quickcrew::domain::{CustomerId, JobDraft, JobType, PaymentMethod, TrustPolicy};
use quickcrew::infrastructure::dispatch::LogDispatcher;
use quickcrew::infrastructure::media::MockMediaStore;
use quickcrew::infrastructure::persistence::InMemoryStore;
use quickcrew::infrastructure::settings::StaticSettings;

/// Full service stack over the in-memory store, with deterministic
/// settings. The same store instance backs both jobs and trust so
/// cross-cutting effects (penalties, locks) are observable.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub jobs: Arc<JobLifecycleService>,
    pub checkpoints: Arc<WorkerCheckpointService>,
    pub trust: Arc<TrustScoreService>,
    pub media: Arc<MockMediaStore>,
}

pub fn test_app() -> TestApp {
    test_app_with(StaticSettings::new(), MockMediaStore::new())
}

pub fn test_app_with(settings: StaticSettings, media: MockMediaStore) -> TestApp {
    let store = Arc::new(InMemoryStore::new(TrustPolicy::default()));
    let settings: Arc<dyn quickcrew::application::ports::SettingsProvider> = Arc::new(settings);
    let media = Arc::new(media);

    let trust = Arc::new(TrustScoreService::new(store.clone(), settings.clone()));
    let pricing = PricingEngine::new(settings.clone());
    let jobs = Arc::new(JobLifecycleService::new(
        store.clone(),
        trust.clone(),
        pricing,
        settings.clone(),
        Arc::new(LogDispatcher::new()),
    ));
    let checkpoints = Arc::new(WorkerCheckpointService::new(
        store.clone(),
        settings,
        media.clone(),
    ));

    TestApp {
        store,
        jobs,
        checkpoints,
        trust,
        media,
    }
}

pub fn customer() -> CustomerId {
    CustomerId::new()
}

/// An unscheduled moving job at the origin.
pub fn draft(worker_quantity: u32) -> JobDraft {
    draft_at(0.0, 0.0, worker_quantity)
}

pub fn draft_at(lat: f64, long: f64, worker_quantity: u32) -> JobDraft {
    JobDraft {
        job_type: JobType::Moving,
        description_text: Some("Move boxes to the third floor".to_string()),
        description_voice_url: None,
        worker_quantity,
        booking_lat: lat,
        booking_long: long,
        booking_address_text: Some("12 Harbor Street".to_string()),
        scheduled_start_time: None,
        estimated_hours: 3.0,
        payment_method: PaymentMethod::Cash,
    }
}
