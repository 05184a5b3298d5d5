use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{CustomerId, TrustActor, WorkerId};
use crate::presentation::handlers::responses::{error_response, repository_error_response};
use crate::presentation::state::AppState;

fn parse_actor(kind: &str, raw_id: &str) -> Result<TrustActor, Response> {
    let id = Uuid::parse_str(raw_id).map_err(|_| {
        error_response(StatusCode::BAD_REQUEST, format!("Invalid actor ID: {}", raw_id))
    })?;
    match kind {
        "customers" => Ok(TrustActor::Customer(CustomerId::from_uuid(id))),
        "workers" => Ok(TrustActor::Worker(WorkerId::from_uuid(id))),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid actor kind: {}", other),
        )),
    }
}

#[derive(Serialize)]
pub struct TrustScoreResponse {
    pub actor_kind: String,
    pub actor_id: String,
    pub score: Decimal,
    pub locked: bool,
}

#[tracing::instrument(skip(state))]
pub async fn trust_score_handler(
    State(state): State<AppState>,
    Path((kind, actor_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let actor = match parse_actor(&kind, &actor_id) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };

    let score = match state.trust.score(actor).await {
        Ok(Some(score)) => score,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("{} not found: {}", actor.kind(), actor_id),
            );
        }
        Err(e) => return repository_error_response(e),
    };
    let locked = match state.trust.is_locked(actor).await {
        Ok(locked) => locked,
        Err(e) => return repository_error_response(e),
    };

    Json(TrustScoreResponse {
        actor_kind: actor.kind().to_string(),
        actor_id: actor.as_uuid().to_string(),
        score,
        locked,
    })
    .into_response()
}

#[derive(Serialize)]
pub struct TrustLedgerEntryResponse {
    pub id: String,
    pub job_id: Option<String>,
    pub action: String,
    pub change_amount: Decimal,
    pub old_score: Decimal,
    pub new_score: Decimal,
    pub description: String,
    pub created_at: String,
}

#[tracing::instrument(skip(state))]
pub async fn trust_ledger_handler(
    State(state): State<AppState>,
    Path((kind, actor_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let actor = match parse_actor(&kind, &actor_id) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };

    match state.trust.ledger(actor).await {
        Ok(entries) => Json(
            entries
                .iter()
                .map(|e| TrustLedgerEntryResponse {
                    id: e.id.to_string(),
                    job_id: e.job_id.map(|id| id.as_uuid().to_string()),
                    action: e.action.as_str().to_string(),
                    change_amount: e.change_amount,
                    old_score: e.old_score,
                    new_score: e.new_score,
                    description: e.description.clone(),
                    created_at: e.created_at.to_rfc3339(),
                })
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => repository_error_response(e),
    }
}
