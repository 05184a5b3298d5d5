mod memory_store;
mod pg_job_store;
mod pg_pool;
mod pg_trust;

pub use memory_store::InMemoryStore;
pub use pg_job_store::PgJobStore;
pub use pg_pool::create_pool;
pub use pg_trust::PgTrustStore;
