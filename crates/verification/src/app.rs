use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use triage_pipeline::StageMetrics;

use crate::state::TrustState;

#[derive(Clone)]
pub struct VerificationState {
    pub trust: Arc<TrustState>,
    pub metrics: Arc<StageMetrics>,
}

#[derive(Debug, Deserialize)]
struct VerifyEmailRequest {
    email: String,
}

#[derive(Debug, Serialize)]
struct VerifyEmailResponse {
    email: String,
    domain_verified: bool,
    user_verified: bool,
}

pub fn app(state: VerificationState) -> Router {
    Router::new()
        .route("/verify_email", post(handle_verify_email))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_verify_email(
    State(state): State<VerificationState>,
    Json(req): Json<VerifyEmailRequest>,
) -> impl IntoResponse {
    let trust = state.trust.get();
    Json(VerifyEmailResponse {
        domain_verified: trust.domain_verified(&req.email),
        user_verified: trust.user_verified(&req.email),
        email: req.email,
    })
}

async fn handle_metrics(State(state): State<VerificationState>) -> impl IntoResponse {
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
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn write_tmp(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("verification-app-test-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn verify_email_reports_domain_and_user_verification() {
        let domains = write_tmp("domains.yaml", "domains:\n  - 'b$'\n");
        let users = write_tmp("users.yaml", "users:\n  - 'trusted@x.com'\n");
        let trust = TrustState::load(domains, users).unwrap();
        let router = app(VerificationState { trust, metrics: Arc::new(StageMetrics::new("verification")) });

        let request = Request::builder()
            .method("POST")
            .uri("/verify_email")
            .header("content-type", "application/json")
            .body(Body::from(json!({"email": "a@b"}).to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
