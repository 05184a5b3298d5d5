use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::{JobFilter, JobSort, PageRequest};
use crate::domain::{CustomerId, JobDraft, JobId, JobStatus, JobType, PaymentMethod};
use crate::presentation::handlers::responses::{
    error_response, identity_header, lifecycle_error_response, repository_error_response,
    AssignmentResponse, JobResponse, PageResponse,
};
use crate::presentation::state::AppState;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub job_type: String,
    pub description_text: Option<String>,
    pub description_voice_url: Option<String>,
    pub worker_quantity: u32,
    pub booking_lat: f64,
    pub booking_long: f64,
    pub booking_address_text: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub estimated_hours: f64,
    pub payment_method: Option<String>,
}

impl CreateJobRequest {
    fn into_draft(self) -> Result<JobDraft, String> {
        let job_type = self.job_type.parse::<JobType>()?;
        let payment_method = match &self.payment_method {
            Some(raw) => raw.parse::<PaymentMethod>()?,
            None => PaymentMethod::Cash,
        };
        if self.worker_quantity < 1 {
            return Err("worker_quantity must be at least 1".to_string());
        }
        if self.estimated_hours <= 0.0 {
            return Err("estimated_hours must be positive".to_string());
        }
        if !(-90.0..=90.0).contains(&self.booking_lat)
            || !(-180.0..=180.0).contains(&self.booking_long)
        {
            return Err("booking coordinates out of range".to_string());
        }

        Ok(JobDraft {
            job_type,
            description_text: self.description_text,
            description_voice_url: self.description_voice_url,
            worker_quantity: self.worker_quantity,
            booking_lat: self.booking_lat,
            booking_long: self.booking_long,
            booking_address_text: self.booking_address_text,
            scheduled_start_time: self.scheduled_start_time,
            estimated_hours: self.estimated_hours,
            payment_method,
        })
    }
}

#[tracing::instrument(skip(state, headers, payload))]
pub async fn create_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateJobRequest>,
) -> impl IntoResponse {
    let customer_id = match identity_header(&headers, CUSTOMER_ID_HEADER) {
        Ok(id) => CustomerId::from_uuid(id),
        Err(resp) => return resp,
    };

    let draft = match payload.into_draft() {
        Ok(d) => d,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.jobs.create(customer_id, draft).await {
        Ok(job) => (StatusCode::CREATED, Json(JobResponse::from(&job))).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
    pub job_type: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[tracing::instrument(skip(state, query))]
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> impl IntoResponse {
    let status = match &query.status {
        Some(raw) => match raw.parse::<JobStatus>() {
            Ok(s) => Some(s),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        },
        None => None,
    };
    let job_type = match &query.job_type {
        Some(raw) => match raw.parse::<JobType>() {
            Ok(t) => Some(t),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
        },
        None => None,
    };
    let sort = match query.sort.as_deref() {
        None | Some("newest") => JobSort::Newest,
        Some("oldest") => JobSort::Oldest,
        Some("price_high") => JobSort::PriceHigh,
        Some("price_low") => JobSort::PriceLow,
        Some(other) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid sort: {}", other),
            );
        }
    };

    let filter = JobFilter {
        status,
        job_type,
        search: query.search,
        sort,
    };
    let page = PageRequest {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };

    match state.jobs.find_all(&filter, page).await {
        Ok(result) => Json(PageResponse::from_jobs(result)).into_response(),
        Err(e) => repository_error_response(e),
    }
}

#[derive(Serialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: JobResponse,
    pub assignments: Vec<AssignmentResponse>,
}

#[tracing::instrument(skip(state))]
pub async fn job_detail_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let job = match state.jobs.find_by_id(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", job_id));
        }
        Err(e) => return repository_error_response(e),
    };

    let assignments = match state.jobs.assignments(job_id).await {
        Ok(list) => list,
        Err(e) => return repository_error_response(e),
    };

    Json(JobDetailResponse {
        job: JobResponse::from(&job),
        assignments: assignments.iter().map(AssignmentResponse::from).collect(),
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct CancelJobRequest {
    pub reason: String,
}

#[derive(Serialize)]
pub struct CancelJobResponse {
    pub status: String,
    pub penalty: String,
    pub released_assignments: usize,
}

#[tracing::instrument(skip(state, headers, payload))]
pub async fn cancel_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(payload): Json<CancelJobRequest>,
) -> impl IntoResponse {
    let customer_id = match identity_header(&headers, CUSTOMER_ID_HEADER) {
        Ok(id) => CustomerId::from_uuid(id),
        Err(resp) => return resp,
    };
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.jobs.cancel(job_id, customer_id, &payload.reason).await {
        Ok(outcome) => Json(CancelJobResponse {
            status: "cancelled".to_string(),
            penalty: outcome.penalty.to_string(),
            released_assignments: outcome.released_assignments,
        })
        .into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct RateJobRequest {
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct RateJobResponse {
    pub rated_workers: Vec<String>,
}

#[tracing::instrument(skip(state, headers, payload))]
pub async fn rate_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(payload): Json<RateJobRequest>,
) -> impl IntoResponse {
    let customer_id = match identity_header(&headers, CUSTOMER_ID_HEADER) {
        Ok(id) => CustomerId::from_uuid(id),
        Err(resp) => return resp,
    };
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state
        .jobs
        .rate_worker(job_id, customer_id, payload.rating, payload.comment.as_deref())
        .await
    {
        Ok(rated) => Json(RateJobResponse {
            rated_workers: rated.iter().map(|w| w.as_uuid().to_string()).collect(),
        })
        .into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

pub(super) fn parse_job_id(raw: &str) -> Result<JobId, axum::response::Response> {
    Uuid::parse_str(raw)
        .map(JobId::from_uuid)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid job ID: {}", raw)))
}
