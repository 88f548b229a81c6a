use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use triage_broker::Broker;
use triage_core::EventRecord;

use crate::classify::classify;
use crate::metrics::IngressMetrics;

#[derive(Clone)]
pub struct IngressState {
    pub broker: Arc<dyn Broker>,
    pub metrics: Arc<IngressMetrics>,
}

pub fn app(state: IngressState) -> Router {
    Router::new()
        .route("/event", post(handle_event))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_event(State(state): State<IngressState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.metrics.requests_total.inc();

    match classify(&body) {
        Some(kind) => {
            state
                .metrics
                .event_types_total
                .with_label_values(&[kind.as_str()])
                .inc();
            // The record's payload equals the request body verbatim — no
            // mutation between ingress and the `event` stream.
            if let Err(e) = state.broker.append("event", EventRecord::new(kind, body)).await {
                warn!(error = %e, "failed to append to event stream");
                state.metrics.errors_total.inc();
            } else {
                info!(kind = %kind, "event classified and queued");
            }
        }
        None => {
            // Unhandled body: still respond 200, never surface this to
            // the caller.
        }
    }

    Json(json!({"message": "Event received"}))
}

async fn handle_metrics(State(state): State<IngressState>) -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use triage_broker::InMemoryBroker;

    fn test_state() -> IngressState {
        IngressState {
            broker: Arc::new(InMemoryBroker::new()),
            metrics: Arc::new(IngressMetrics::new()),
        }
    }

    #[tokio::test]
    async fn posting_a_recognized_event_appends_the_verbatim_body() {
        let state = test_state();
        let broker = state.broker.clone();
        let router = app(state);

        let body = json!({"event_name": "user_create", "email": "a@b", "user_id": 7});
        let request = Request::builder()
            .method("POST")
            .uri("/event")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let delivery = broker
            .read_one("event", std::time::Duration::from_millis(50))
            .await
            .unwrap()
            .expect("one queued record");
        assert_eq!(delivery.record.payload, body);
    }

    #[tokio::test]
    async fn unrecognized_body_still_returns_200_and_stream_unchanged() {
        let state = test_state();
        let broker = state.broker.clone();
        let router = app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/event")
            .header("content-type", "application/json")
            .body(Body::from(json!({"nothing": "useful"}).to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let empty = broker
            .read_one("event", std::time::Duration::from_millis(20))
            .await
            .unwrap();
        assert!(empty.is_none());
    }
}
