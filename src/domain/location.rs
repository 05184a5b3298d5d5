use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One live GPS reading from a worker on a job. Ephemeral: lives only in
/// the relay's last-known-position cache, never in the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub job_id: Uuid,
    pub worker_id: Uuid,
    pub lat: f64,
    pub long: f64,
    pub heading_degrees: f64,
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}
