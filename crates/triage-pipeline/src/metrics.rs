use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

/// Per-stage metrics handle, passed explicitly to whatever needs to
/// record against it — no global mutable registry, mirroring the design
/// notes' rejection of the source's global-dict metrics.
pub struct StageMetrics {
    registry: Registry,
    pub messages_read: IntCounter,
    pub messages_acked: IntCounter,
    pub messages_nacked: IntCounter,
    pub messages_dropped: IntCounter,
    pub process_duration: Histogram,
}

impl StageMetrics {
    pub fn new(stage: &str) -> Self {
        let registry = Registry::new();

        let messages_read = IntCounter::new(
            format!("{stage}_messages_read_total"),
            "messages read from the input stream",
        )
        .expect("valid metric");
        let messages_acked = IntCounter::new(
            format!("{stage}_messages_acked_total"),
            "messages successfully processed and acked",
        )
        .expect("valid metric");
        let messages_nacked = IntCounter::new(
            format!("{stage}_messages_nacked_total"),
            "messages left in place after a transient failure",
        )
        .expect("valid metric");
        let messages_dropped = IntCounter::new(
            format!("{stage}_messages_dropped_total"),
            "messages dropped after a permanent failure",
        )
        .expect("valid metric");
        let process_duration = Histogram::with_opts(HistogramOpts::new(
            format!("{stage}_process_duration_seconds"),
            "time spent in the stage's process step",
        ))
        .expect("valid metric");

        registry.register(Box::new(messages_read.clone())).unwrap();
        registry.register(Box::new(messages_acked.clone())).unwrap();
        registry.register(Box::new(messages_nacked.clone())).unwrap();
        registry.register(Box::new(messages_dropped.clone())).unwrap();
        registry.register(Box::new(process_duration.clone())).unwrap();

        Self {
            registry,
            messages_read,
            messages_acked,
            messages_nacked,
            messages_dropped,
            process_duration,
        }
    }

    /// Registers an additional collector (e.g. a stage's own business
    /// counters) into this stage's registry so it shows up on `/metrics`
    /// alongside the runtime counters.
    pub fn register(&self, collector: Box<dyn prometheus::core::Collector>) {
        self.registry
            .register(collector)
            .expect("metric name collision");
    }

    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf).expect("encode metrics");
        String::from_utf8(buf).expect("prometheus output is utf8")
    }
}

async fn metrics_handler(State(metrics): State<Arc<StageMetrics>>) -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics.render(),
    )
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok"}))
}

/// Mirrors the teacher's `spawn_metrics_server` shape (a collector state
/// handed to handlers via an axum `Router`) but renders Prometheus text
/// exposition format instead of JSON, per the text-format requirement
/// every stage's `/metrics` endpoint has to satisfy.
pub fn metrics_router(metrics: Arc<StageMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
}
