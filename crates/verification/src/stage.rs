use std::sync::Arc;

use tracing::debug;
use triage_broker::Broker;
use triage_core::TrustList;
use triage_pipeline::{ProcessOutcome, Stage, StageContext};
use triage_platform::PlatformClient;

use crate::error::VerificationError;
use crate::extract::extract_email;
use crate::state::TrustState;

/// Builds the Verification stage: reads `event`, drops trusted actors,
/// forwards everything else (snippets unconditionally) to
/// `verification`.
pub fn build_stage(broker: Arc<dyn Broker>, trust: Arc<TrustState>, platform: Arc<PlatformClient>) -> Stage {
    Stage::builder("verification")
        .input_stream("event")
        .output_stream("verification")
        .broker(broker)
        .on_message(move |ctx, kind, payload| {
            let trust = trust.clone();
            let platform = platform.clone();
            async move { process_one(&ctx, kind, payload, &trust.get(), &platform).await }
        })
        .build()
}

async fn process_one(
    ctx: &StageContext,
    kind: triage_core::EventKind,
    payload: serde_json::Value,
    trust: &TrustList,
    platform: &PlatformClient,
) -> ProcessOutcome {
    if kind.is_snippet() {
        return forward(ctx, kind, payload).await;
    }

    match extract_email(kind, &payload, platform).await {
        Ok(Some(email)) if trust.is_trusted(&email) => {
            debug!(%kind, email, "trusted actor, dropping");
            ProcessOutcome::Ack
        }
        Ok(Some(_)) => forward(ctx, kind, payload).await,
        Ok(None) => ProcessOutcome::Drop("no email extractable for this event".to_string()),
        Err(VerificationError::PlatformFailure(e)) => {
            ProcessOutcome::Drop(format!("platform API failure during group lookup: {e}"))
        }
        Err(e) => ProcessOutcome::Drop(e.to_string()),
    }
}

async fn forward(ctx: &StageContext, kind: triage_core::EventKind, payload: serde_json::Value) -> ProcessOutcome {
    match ctx.emit(kind, payload).await {
        Ok(()) => ProcessOutcome::Ack,
        Err(_) => ProcessOutcome::Nack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use triage_broker::InMemoryBroker;
    use triage_core::EventKind;
    use triage_core::EventRecord;

    fn write_tmp(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("verification-stage-test-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn trusted_domain_is_dropped_not_forwarded() {
        let domains = write_tmp("d1.yaml", "domains:\n  - 'b$'\n");
        let users = write_tmp("u1.yaml", "users: []\n");
        let trust = TrustState::load(domains, users).unwrap();
        let platform = Arc::new(PlatformClient::new("http://localhost", "t", Duration::from_secs(1)));
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());

        broker
            .append(
                "event",
                EventRecord::new(EventKind::UserCreate, json!({"email": "a@b", "user_id": 7})),
            )
            .await
            .unwrap();

        let stage = build_stage(broker.clone(), trust, platform);
        assert!(stage.run_once().await);

        let health = broker.health_check().await.unwrap();
        assert_eq!(health.stream_depths.get("verification").copied().unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn untrusted_domain_is_forwarded_unchanged() {
        let domains = write_tmp("d2.yaml", "domains:\n  - 'b$'\n");
        let users = write_tmp("u2.yaml", "users: []\n");
        let trust = TrustState::load(domains, users).unwrap();
        let platform = Arc::new(PlatformClient::new("http://localhost", "t", Duration::from_secs(1)));
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());

        let payload = json!({"email": "a@c", "user_id": 7});
        broker
            .append("event", EventRecord::new(EventKind::UserCreate, payload.clone()))
            .await
            .unwrap();

        let stage = build_stage(broker.clone(), trust, platform);
        assert!(stage.run_once().await);

        let delivery = broker
            .read_one("verification", Duration::from_millis(50))
            .await
            .unwrap()
            .expect("forwarded record");
        assert_eq!(delivery.record.payload, payload);
    }

    #[tokio::test]
    async fn snippet_kind_always_forwards() {
        let domains = write_tmp("d3.yaml", "domains: []\n");
        let users = write_tmp("u3.yaml", "users: []\n");
        let trust = TrustState::load(domains, users).unwrap();
        let platform = Arc::new(PlatformClient::new("http://localhost", "t", Duration::from_secs(1)));
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());

        broker
            .append("event", EventRecord::new(EventKind::SnippetCheck, json!({})))
            .await
            .unwrap();

        let stage = build_stage(broker.clone(), trust, platform);
        assert!(stage.run_once().await);

        let health = broker.health_check().await.unwrap();
        assert_eq!(health.stream_depths.get("verification").copied().unwrap_or(0), 1);
    }
}
