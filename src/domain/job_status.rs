use std::fmt;
use std::str::FromStr;

/// Job-level lifecycle: searching -> locked -> in_progress -> completed,
/// with cancellation allowed from searching and locked only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Searching,
    Locked,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Searching => "searching",
            JobStatus::Locked => "locked",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Cancellation is rejected once work has started.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, JobStatus::Searching | JobStatus::Locked)
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "searching" => Ok(JobStatus::Searching),
            "locked" => Ok(JobStatus::Locked),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
