use std::sync::Arc;

use tracing::error;
use triage_broker::Broker;
use triage_core::EventKind;
use triage_pipeline::{ProcessOutcome, Stage, StageContext};
use triage_platform::{PlatformClient, PlatformError};

use crate::error::RetrievalError;
use crate::fetch::fetch_object;
use crate::snippet::fetch_untrusted_snippets;

pub struct RetrievalDeps {
    pub platform: Arc<PlatformClient>,
    pub http: reqwest::Client,
    pub verify_email_url: String,
}

pub fn build_stage(broker: Arc<dyn Broker>, deps: RetrievalDeps) -> Stage {
    let deps = Arc::new(deps);
    Stage::builder("retrieval")
        .input_stream("verification")
        .output_stream("retrieval")
        .broker(broker)
        .on_message(move |ctx, kind, payload| {
            let deps = deps.clone();
            async move { process_one(&ctx, kind, payload, &deps).await }
        })
        .build()
}

async fn process_one(ctx: &StageContext, kind: EventKind, payload: serde_json::Value, deps: &RetrievalDeps) -> ProcessOutcome {
    if kind.is_snippet() {
        return process_snippet(ctx, kind, deps).await;
    }

    match fetch_object(kind, &payload, &deps.platform).await {
        Ok(object) => match ctx.emit(kind, object).await {
            Ok(()) => ProcessOutcome::Ack,
            Err(_) => ProcessOutcome::Nack,
        },
        Err(RetrievalError::Platform(PlatformError::NotFound)) => {
            ProcessOutcome::Drop("platform object not found".to_string())
        }
        Err(RetrievalError::Platform(PlatformError::Transient(reason))) => {
            // Retry budget already exhausted inside the platform client.
            // Open Question resolved: treat as still-transient, leave
            // for redelivery rather than promoting to permanent.
            error!(reason, "retrieval transient failure, leaving for redelivery");
            ProcessOutcome::Nack
        }
        Err(e) => ProcessOutcome::Drop(e.to_string()),
    }
}

async fn process_snippet(ctx: &StageContext, kind: EventKind, deps: &RetrievalDeps) -> ProcessOutcome {
    match fetch_untrusted_snippets(&deps.platform, &deps.http, &deps.verify_email_url).await {
        Ok(snippets) => {
            for snippet in snippets {
                if let Err(_) = ctx.emit(kind, snippet).await {
                    return ProcessOutcome::Nack;
                }
            }
            ProcessOutcome::Ack
        }
        Err(RetrievalError::Platform(PlatformError::NotFound)) => {
            ProcessOutcome::Drop("snippet list endpoint returned not found".to_string())
        }
        Err(RetrievalError::Platform(PlatformError::Transient(reason))) => {
            error!(reason, "snippet listing transient failure, leaving for redelivery");
            ProcessOutcome::Nack
        }
        Err(e) => ProcessOutcome::Drop(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use triage_broker::InMemoryBroker;
    use triage_core::EventRecord;

    #[tokio::test]
    async fn missing_required_field_is_a_permanent_drop() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        broker
            .append("verification", EventRecord::new(EventKind::UserCreate, json!({})))
            .await
            .unwrap();

        let deps = RetrievalDeps {
            platform: Arc::new(PlatformClient::new("http://127.0.0.1:1", "t", Duration::from_millis(50))),
            http: reqwest::Client::new(),
            verify_email_url: "http://127.0.0.1:1".to_string(),
        };
        let stage = build_stage(broker.clone(), deps);
        assert!(stage.run_once().await);

        let health = broker.health_check().await.unwrap();
        assert_eq!(health.stream_depths.get("verification").copied().unwrap_or(0), 0);
        assert_eq!(health.stream_depths.get("retrieval").copied().unwrap_or(0), 0);
    }
}
