use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::WorkerId;
use crate::presentation::handlers::jobs::parse_job_id;
use crate::presentation::handlers::responses::{
    error_response, identity_header, lifecycle_error_response, AssignmentResponse,
};
use crate::presentation::state::AppState;

pub const WORKER_ID_HEADER: &str = "x-worker-id";

#[tracing::instrument(skip(state, headers))]
pub async fn accept_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let worker_id = match identity_header(&headers, WORKER_ID_HEADER) {
        Ok(id) => WorkerId::from_uuid(id),
        Err(resp) => return resp,
    };
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.jobs.accept(job_id, worker_id).await {
        Ok(assignment) => {
            (StatusCode::CREATED, Json(AssignmentResponse::from(&assignment))).into_response()
        }
        Err(e) => lifecycle_error_response(e),
    }
}

/// Fields of the arrival check-in form: coordinates plus an optional
/// photo part.
struct ArrivalForm {
    lat: f64,
    long: f64,
    photo: Option<Vec<u8>>,
}

async fn read_arrival_form(mut multipart: Multipart) -> Result<ArrivalForm, Response> {
    let mut lat = None;
    let mut long = None;
    let mut photo = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                ));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "lat" | "long" => {
                let text = field.text().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Invalid {}: {}", name, e))
                })?;
                let value: f64 = text.trim().parse().map_err(|_| {
                    error_response(StatusCode::BAD_REQUEST, format!("Invalid {}: {}", name, text))
                })?;
                if name == "lat" {
                    lat = Some(value);
                } else {
                    long = Some(value);
                }
            }
            "photo" => {
                let bytes = field.bytes().await.map_err(|e| {
                    error_response(StatusCode::BAD_REQUEST, format!("Failed to read photo: {}", e))
                })?;
                photo = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    match (lat, long) {
        (Some(lat), Some(long)) => Ok(ArrivalForm { lat, long, photo }),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            "lat and long form fields are required",
        )),
    }
}

#[tracing::instrument(skip(state, headers, multipart))]
pub async fn arrive_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    multipart: Multipart,
) -> impl IntoResponse {
    let worker_id = match identity_header(&headers, WORKER_ID_HEADER) {
        Ok(id) => WorkerId::from_uuid(id),
        Err(resp) => return resp,
    };
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let form = match read_arrival_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    match state
        .checkpoints
        .arrive(worker_id, job_id, form.lat, form.long, form.photo.as_deref())
        .await
    {
        Ok(assignment) => Json(AssignmentResponse::from(&assignment)).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

#[tracing::instrument(skip(state, headers))]
pub async fn start_work_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let worker_id = match identity_header(&headers, WORKER_ID_HEADER) {
        Ok(id) => WorkerId::from_uuid(id),
        Err(resp) => return resp,
    };
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.checkpoints.start(worker_id, job_id).await {
        Ok(assignment) => Json(AssignmentResponse::from(&assignment)).into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}

#[derive(Serialize)]
pub struct CompleteResponse {
    #[serde(flatten)]
    pub assignment: AssignmentResponse,
    pub job_completed: bool,
}

async fn read_optional_photo(mut multipart: Multipart) -> Result<Option<Vec<u8>>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(None),
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                ));
            }
        };
        if field.name() == Some("photo") {
            let bytes = field.bytes().await.map_err(|e| {
                error_response(StatusCode::BAD_REQUEST, format!("Failed to read photo: {}", e))
            })?;
            return Ok(Some(bytes.to_vec()));
        }
    }
}

#[tracing::instrument(skip(state, headers, multipart))]
pub async fn complete_work_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    multipart: Multipart,
) -> impl IntoResponse {
    let worker_id = match identity_header(&headers, WORKER_ID_HEADER) {
        Ok(id) => WorkerId::from_uuid(id),
        Err(resp) => return resp,
    };
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let photo = match read_optional_photo(multipart).await {
        Ok(photo) => photo,
        Err(resp) => return resp,
    };

    match state
        .checkpoints
        .complete(worker_id, job_id, photo.as_deref())
        .await
    {
        Ok(outcome) => Json(CompleteResponse {
            assignment: AssignmentResponse::from(&outcome.assignment),
            job_completed: outcome.job_completed,
        })
        .into_response(),
        Err(e) => lifecycle_error_response(e),
    }
}
