use prometheus::{CounterVec, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder, Encoder};

/// Business counters beyond the runtime's own ack/nack/drop metrics,
/// grounded in the original service's `successful_requests`,
/// `failed_requests`, and `score_histogram` counters.
pub struct ClassificationMetrics {
    registry: Registry,
    pub successful_requests: IntCounter,
    pub failed_requests: IntCounter,
    pub event_types: CounterVec,
    pub score_histogram: Histogram,
}

impl ClassificationMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let successful_requests = IntCounter::new(
            "classification_successful_requests_total",
            "model server calls that returned 200",
        )
        .expect("valid metric");
        let failed_requests = IntCounter::new(
            "classification_failed_requests_total",
            "model server calls that failed after retry",
        )
        .expect("valid metric");
        let event_types = CounterVec::new(
            Opts::new("classification_event_types_total", "classified envelopes by kind"),
            &["kind"],
        )
        .expect("valid metric");
        let score_histogram = Histogram::with_opts(
            HistogramOpts::new("classification_score", "spam score distribution")
                .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
        )
        .expect("valid metric");

        registry.register(Box::new(successful_requests.clone())).unwrap();
        registry.register(Box::new(failed_requests.clone())).unwrap();
        registry.register(Box::new(event_types.clone())).unwrap();
        registry.register(Box::new(score_histogram.clone())).unwrap();

        Self {
            registry,
            successful_requests,
            failed_requests,
            event_types,
            score_histogram,
        }
    }

    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf).expect("encode metrics");
        String::from_utf8(buf).expect("prometheus output is utf8")
    }
}

impl Default for ClassificationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
