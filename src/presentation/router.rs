use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    accept_job_handler, arrive_handler, cancel_job_handler, complete_work_handler,
    create_job_handler, health_handler, job_detail_handler, list_jobs_handler,
    location_ws_handler, rate_job_handler, start_work_handler, trust_ledger_handler,
    trust_score_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/jobs", post(create_job_handler).get(list_jobs_handler))
        .route("/api/v1/jobs/{job_id}", get(job_detail_handler))
        .route("/api/v1/jobs/{job_id}/cancel", post(cancel_job_handler))
        .route("/api/v1/jobs/{job_id}/rating", post(rate_job_handler))
        .route("/api/v1/jobs/{job_id}/accept", post(accept_job_handler))
        .route("/api/v1/jobs/{job_id}/arrive", post(arrive_handler))
        .route("/api/v1/jobs/{job_id}/start", post(start_work_handler))
        .route("/api/v1/jobs/{job_id}/complete", post(complete_work_handler))
        .route("/api/v1/jobs/{job_id}/location", get(location_ws_handler))
        .route(
            "/api/v1/trust/{actor_kind}/{actor_id}",
            get(trust_score_handler),
        )
        .route(
            "/api/v1/trust/{actor_kind}/{actor_id}/ledger",
            get(trust_ledger_handler),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
