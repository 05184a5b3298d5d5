use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{AssignmentId, JobId, WorkerId};

/// Per-worker sub-state: accepted -> arrived -> in_progress -> done.
/// Cancellation of the parent job cascades to `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentStatus {
    Accepted,
    Arrived,
    InProgress,
    Done,
    Cancelled,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Arrived => "arrived",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Done => "done",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    /// An assignment in any of these states holds one of the job's slots.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AssignmentStatus::Cancelled)
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(AssignmentStatus::Accepted),
            "arrived" => Ok(AssignmentStatus::Arrived),
            "in_progress" => Ok(AssignmentStatus::InProgress),
            "done" => Ok(AssignmentStatus::Done),
            "cancelled" => Ok(AssignmentStatus::Cancelled),
            _ => Err(format!("Invalid assignment status: {}", s)),
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One worker's participation in one job. (job_id, worker_id) is unique.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: AssignmentId,
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub status: AssignmentStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub check_in_photo_url: Option<String>,
    pub check_out_photo_url: Option<String>,
    pub earning_amount: Option<Decimal>,
    pub is_leader: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn accepted(job_id: JobId, worker_id: WorkerId, is_leader: bool) -> Self {
        let now = Utc::now();
        Self {
            id: AssignmentId::new(),
            job_id,
            worker_id,
            status: AssignmentStatus::Accepted,
            accepted_at: Some(now),
            arrived_at: None,
            started_at: None,
            finished_at: None,
            check_in_photo_url: None,
            check_out_photo_url: None,
            earning_amount: None,
            is_leader,
            created_at: now,
            updated_at: now,
        }
    }
}
