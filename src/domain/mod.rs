mod assignment;
mod geo;
mod ids;
mod job;
mod job_status;
mod location;
mod trust;

pub use assignment::{Assignment, AssignmentStatus};
pub use geo::distance_meters;
pub use ids::{AssignmentId, CustomerId, JobId, WorkerId};
pub use job::{Job, JobDraft, JobType, PaymentMethod, PaymentStatus};
pub use job_status::JobStatus;
pub use location::LocationSample;
pub use trust::{TrustAction, TrustActor, TrustLedgerEntry, TrustMutation, TrustPolicy};
