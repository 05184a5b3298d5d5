use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{LifecycleError, Page, RepositoryError};
use crate::domain::{Assignment, Job};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn lifecycle_error_response(e: LifecycleError) -> Response {
    let status = match &e {
        LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::InvalidState(_)
        | LifecycleError::CapacityExceeded
        | LifecycleError::AlreadyAssigned => StatusCode::CONFLICT,
        LifecycleError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::Unauthorized(_) => StatusCode::FORBIDDEN,
        LifecycleError::Dependency(_) => StatusCode::BAD_GATEWAY,
        LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "Request failed");
    }
    error_response(status, e.to_string())
}

pub fn repository_error_response(e: RepositoryError) -> Response {
    tracing::error!(error = %e, "Storage failure");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Caller identity from a gateway-verified header. Authentication proper
/// sits in front of this service.
pub fn identity_header(headers: &HeaderMap, name: &str) -> Result<Uuid, Response> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                format!("Missing or invalid {} header", name),
            )
        })
}

#[derive(Serialize)]
pub struct JobResponse {
    pub id: String,
    pub customer_id: String,
    pub job_type: String,
    pub description_text: Option<String>,
    pub description_voice_url: Option<String>,
    pub worker_quantity: u32,
    pub booking_lat: f64,
    pub booking_long: f64,
    pub booking_address_text: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub estimated_hours: f64,
    pub price_estimated: Decimal,
    pub final_price: Decimal,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub cancel_reason: Option<String>,
    pub auto_expire_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.as_uuid().to_string(),
            customer_id: job.customer_id.as_uuid().to_string(),
            job_type: job.job_type.as_str().to_string(),
            description_text: job.description_text.clone(),
            description_voice_url: job.description_voice_url.clone(),
            worker_quantity: job.worker_quantity,
            booking_lat: job.booking_lat,
            booking_long: job.booking_long,
            booking_address_text: job.booking_address_text.clone(),
            scheduled_start_time: job.scheduled_start_time.map(|t| t.to_rfc3339()),
            estimated_hours: job.estimated_hours,
            price_estimated: job.price_estimated,
            final_price: job.final_price,
            status: job.status.as_str().to_string(),
            payment_method: job.payment_method.as_str().to_string(),
            payment_status: job.payment_status.as_str().to_string(),
            cancel_reason: job.cancel_reason.clone(),
            auto_expire_at: job.auto_expire_at.map(|t| t.to_rfc3339()),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct AssignmentResponse {
    pub id: String,
    pub job_id: String,
    pub worker_id: String,
    pub status: String,
    pub accepted_at: Option<String>,
    pub arrived_at: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub check_in_photo_url: Option<String>,
    pub check_out_photo_url: Option<String>,
    pub earning_amount: Option<Decimal>,
    pub is_leader: bool,
}

impl From<&Assignment> for AssignmentResponse {
    fn from(a: &Assignment) -> Self {
        Self {
            id: a.id.as_uuid().to_string(),
            job_id: a.job_id.as_uuid().to_string(),
            worker_id: a.worker_id.as_uuid().to_string(),
            status: a.status.as_str().to_string(),
            accepted_at: a.accepted_at.map(|t| t.to_rfc3339()),
            arrived_at: a.arrived_at.map(|t| t.to_rfc3339()),
            started_at: a.started_at.map(|t| t.to_rfc3339()),
            finished_at: a.finished_at.map(|t| t.to_rfc3339()),
            check_in_photo_url: a.check_in_photo_url.clone(),
            check_out_photo_url: a.check_out_photo_url.clone(),
            earning_amount: a.earning_amount,
            is_leader: a.is_leader,
        }
    }
}

#[derive(Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageResponse<JobResponse> {
    pub fn from_jobs(page: Page<Job>) -> Self {
        Self {
            data: page.data.iter().map(JobResponse::from).collect(),
            page: page.page,
            limit: page.limit,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}
