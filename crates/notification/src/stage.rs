use std::sync::Arc;

use serde_json::Value;
use tracing::warn;
use triage_broker::Broker;
use triage_core::{ClassificationEnvelope, EventKind};
use triage_pipeline::{ProcessOutcome, Stage};

use crate::metrics::NotificationMetrics;
use crate::templates::render;

pub struct NotificationDeps {
    pub http: reqwest::Client,
    pub webhook_url: String,
    pub metrics: Arc<NotificationMetrics>,
}

pub fn build_stage(broker: Arc<dyn Broker>, deps: NotificationDeps) -> Stage {
    let deps = Arc::new(deps);
    Stage::builder("notification")
        .input_stream("classification")
        .broker(broker)
        .on_message(move |_ctx, kind, payload| {
            let deps = deps.clone();
            async move { process_one(kind, payload, &deps).await }
        })
        .build()
}

async fn process_one(kind: EventKind, payload: Value, deps: &NotificationDeps) -> ProcessOutcome {
    let envelope: ClassificationEnvelope = match serde_json::from_value(payload) {
        Ok(e) => e,
        Err(e) => return ProcessOutcome::Drop(format!("malformed classification envelope: {e}")),
    };

    let message = render(kind, &envelope);
    match deps.http.post(&deps.webhook_url).json(&message).send().await {
        Ok(response) if response.status().is_success() => {
            deps.metrics.delivered.inc();
        }
        Ok(response) => {
            warn!(status = %response.status(), "chat webhook returned a non-200 response");
            deps.metrics.failed.inc();
        }
        Err(e) => {
            warn!(error = %e, "chat webhook request failed");
            deps.metrics.failed.inc();
        }
    }

    // The record is considered handled regardless of delivery outcome.
    ProcessOutcome::Ack
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use triage_broker::InMemoryBroker;
    use triage_core::EventRecord;

    #[tokio::test]
    async fn malformed_envelope_is_a_permanent_drop() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        broker
            .append("classification", EventRecord::new(EventKind::UserCreate, json!("not an envelope")))
            .await
            .unwrap();

        let deps = NotificationDeps {
            http: reqwest::Client::builder().timeout(Duration::from_millis(100)).build().unwrap(),
            webhook_url: "http://127.0.0.1:1".to_string(),
            metrics: Arc::new(NotificationMetrics::new()),
        };
        let stage = build_stage(broker.clone(), deps);
        assert!(stage.run_once().await);

        let health = broker.health_check().await.unwrap();
        assert_eq!(health.stream_depths.get("classification").copied().unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn delivery_failure_still_acks_the_record() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        broker
            .append(
                "classification",
                EventRecord::new(
                    EventKind::UserCreate,
                    serde_json::to_value(ClassificationEnvelope::scored(json!({}), 1, 0.9)).unwrap(),
                ),
            )
            .await
            .unwrap();

        let deps = NotificationDeps {
            http: reqwest::Client::builder().timeout(Duration::from_millis(100)).build().unwrap(),
            webhook_url: "http://127.0.0.1:1".to_string(),
            metrics: Arc::new(NotificationMetrics::new()),
        };
        let stage = build_stage(broker.clone(), deps);
        assert!(stage.run_once().await);

        let health = broker.health_check().await.unwrap();
        assert_eq!(health.stream_depths.get("classification").copied().unwrap_or(0), 0);
    }
}
