mod dispatcher;
mod job_store;
mod lifecycle_error;
mod media_store;
mod repository_error;
mod settings_provider;
mod trust_store;

pub use dispatcher::JobDispatcher;
pub use job_store::{
    CancelOutcome, CancelPenalties, CompleteOutcome, JobFilter, JobSort, JobStore, Page,
    PageRequest,
};
pub use lifecycle_error::LifecycleError;
pub use media_store::{MediaStore, MediaStoreError};
pub use repository_error::RepositoryError;
pub use settings_provider::{SettingsError, SettingsProvider};
pub use trust_store::TrustStore;
