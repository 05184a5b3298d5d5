use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{JobId, LocationSample};
use crate::presentation::handlers::jobs::parse_job_id;
use crate::presentation::state::AppState;

/// Inbound frame from a publishing worker connection. Viewers never send
/// frames; the timestamp is stamped server-side.
#[derive(Deserialize)]
struct PublishFrame {
    worker_id: Uuid,
    lat: f64,
    long: f64,
    #[serde(default)]
    heading_degrees: f64,
    #[serde(default)]
    speed: Option<f64>,
}

#[tracing::instrument(skip(state, ws))]
pub async fn location_ws_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    ws.on_upgrade(move |socket| relay_session(state, job_id, socket))
        .into_response()
}

/// One relay connection: frames received from the socket are published
/// to the job's channel, samples from other connections are pushed back
/// out. The publisher never receives an echo of its own frames.
async fn relay_session(state: AppState, job_id: JobId, socket: WebSocket) {
    let mut subscription = state.relay.subscribe(job_id).await;
    let subscriber_id = subscription.id;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<PublishFrame>(&text) {
                            Ok(frame) => {
                                let sample = LocationSample {
                                    job_id: job_id.as_uuid(),
                                    worker_id: frame.worker_id,
                                    lat: frame.lat,
                                    long: frame.long,
                                    heading_degrees: frame.heading_degrees,
                                    speed: frame.speed,
                                    timestamp: Utc::now(),
                                };
                                state.relay.publish(sample, Some(subscriber_id)).await;
                            }
                            Err(e) => {
                                warn!(error = %e, "Discarding malformed location frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "Relay socket error");
                        break;
                    }
                }
            }
            outbound = subscription.receiver.recv() => {
                match outbound {
                    Some(sample) => {
                        let payload = match serde_json::to_string(&sample) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(error = %e, "Failed to serialize location sample");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.relay.unsubscribe(job_id, subscriber_id).await;
    debug!(job_id = %job_id, subscriber = %subscriber_id, "Relay session closed");
}
