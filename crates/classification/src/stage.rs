use std::sync::Arc;

use serde_json::to_value;
use triage_broker::Broker;
use triage_core::EventKind;
use triage_pipeline::{ProcessOutcome, Stage, StageContext};

use crate::metrics::ClassificationMetrics;
use crate::model::classify;

pub struct ClassificationDeps {
    pub http: reqwest::Client,
    pub model_base_url: String,
    pub metrics: Arc<ClassificationMetrics>,
}

pub fn build_stage(broker: Arc<dyn Broker>, deps: ClassificationDeps) -> Stage {
    let deps = Arc::new(deps);
    Stage::builder("classification")
        .input_stream("retrieval")
        .output_stream("classification")
        .broker(broker)
        .on_message(move |ctx, kind, payload| {
            let deps = deps.clone();
            async move { process_one(&ctx, kind, payload, &deps).await }
        })
        .build()
}

async fn process_one(ctx: &StageContext, kind: EventKind, payload: serde_json::Value, deps: &ClassificationDeps) -> ProcessOutcome {
    let envelope = classify(&deps.http, &deps.model_base_url, kind, payload).await;

    if envelope.prediction == triage_core::Prediction::NotAvailable {
        deps.metrics.failed_requests.inc();
    } else {
        deps.metrics.successful_requests.inc();
        deps.metrics.score_histogram.observe(envelope.score);
    }
    deps.metrics.event_types.with_label_values(&[kind.as_str()]).inc();

    let value = match to_value(&envelope) {
        Ok(v) => v,
        Err(e) => return ProcessOutcome::Drop(format!("envelope serialization failed: {e}")),
    };

    match ctx.emit(kind, value).await {
        Ok(()) => ProcessOutcome::Ack,
        Err(_) => ProcessOutcome::Nack,
    }
}
