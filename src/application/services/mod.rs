mod checkpoint_service;
mod job_service;
mod location_relay;
mod pricing;
mod trust_service;

pub use checkpoint_service::WorkerCheckpointService;
pub use job_service::JobLifecycleService;
pub use location_relay::{LocationRelay, SubscriberId, Subscription};
pub use pricing::PricingEngine;
pub use trust_service::TrustScoreService;
