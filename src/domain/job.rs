use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{CustomerId, JobId, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    Loading,
    Cleaning,
    Moving,
    OddJobs,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Loading => "loading",
            JobType::Cleaning => "cleaning",
            JobType::Moving => "moving",
            JobType::OddJobs => "odd_jobs",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loading" => Ok(JobType::Loading),
            "cleaning" => Ok(JobType::Cleaning),
            "moving" => Ok(JobType::Moving),
            "odd_jobs" => Ok(JobType::OddJobs),
            _ => Err(format!("Invalid job type: {}", s)),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refund,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refund => "refund",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "refund" => Ok(PaymentStatus::Refund),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// A unit of requested labor posted by a customer. `final_price` mirrors
/// the estimate until the job reaches `completed`.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub customer_id: CustomerId,
    pub job_type: JobType,
    pub description_text: Option<String>,
    pub description_voice_url: Option<String>,
    pub worker_quantity: u32,
    pub booking_lat: f64,
    pub booking_long: f64,
    pub booking_address_text: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub estimated_hours: f64,
    pub price_estimated: Decimal,
    pub final_price: Decimal,
    pub status: JobStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub cancel_reason: Option<String>,
    pub auto_expire_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated creation payload, produced by the presentation-layer
/// validator before it reaches the lifecycle service.
#[derive(Debug, Clone)]
pub struct JobDraft {
    pub job_type: JobType,
    pub description_text: Option<String>,
    pub description_voice_url: Option<String>,
    pub worker_quantity: u32,
    pub booking_lat: f64,
    pub booking_long: f64,
    pub booking_address_text: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub estimated_hours: f64,
    pub payment_method: PaymentMethod,
}

impl Job {
    pub fn from_draft(
        customer_id: CustomerId,
        draft: JobDraft,
        price_estimated: Decimal,
        auto_expire_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            customer_id,
            job_type: draft.job_type,
            description_text: draft.description_text,
            description_voice_url: draft.description_voice_url,
            worker_quantity: draft.worker_quantity,
            booking_lat: draft.booking_lat,
            booking_long: draft.booking_long,
            booking_address_text: draft.booking_address_text,
            scheduled_start_time: draft.scheduled_start_time,
            estimated_hours: draft.estimated_hours,
            price_estimated,
            final_price: price_estimated,
            status: JobStatus::Searching,
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Unpaid,
            cancel_reason: None,
            auto_expire_at,
            created_at: now,
            updated_at: now,
        }
    }
}
