use super::RepositoryError;

/// Business-level failure taxonomy for lifecycle and checkpoint
/// operations. `InvalidState`, `CapacityExceeded` and `AlreadyAssigned`
/// are expected outcomes callers may branch on; `Dependency` and `Store`
/// signal infrastructure faults and are retry candidates.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("job already has its full worker quantity")]
    CapacityExceeded,
    #[error("worker already holds an assignment on this job")]
    AlreadyAssigned,
    #[error("position is {distance_meters:.0}m from the booking point, allowed {allowed_meters:.0}m")]
    OutOfRange {
        distance_meters: f64,
        allowed_meters: f64,
    },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("dependency failure: {0}")]
    Dependency(String),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}
