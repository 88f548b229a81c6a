use prometheus::{CounterVec, Encoder, IntCounter, Opts, Registry, TextEncoder};

/// Ingress-specific counters, grounded in the original service's
/// `event_service_requests_total` / `event_service_event_types_total` /
/// `event_service_errors_total` Prometheus metrics.
pub struct IngressMetrics {
    registry: Registry,
    pub requests_total: IntCounter,
    pub event_types_total: CounterVec,
    pub errors_total: IntCounter,
}

impl IngressMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_total = IntCounter::new("ingress_requests_total", "webhook requests received")
            .expect("valid metric");
        let event_types_total = CounterVec::new(
            Opts::new("ingress_event_types_total", "classified events by kind"),
            &["kind"],
        )
        .expect("valid metric");
        let errors_total = IntCounter::new("ingress_errors_total", "unhandled or malformed requests")
            .expect("valid metric");

        registry.register(Box::new(requests_total.clone())).unwrap();
        registry.register(Box::new(event_types_total.clone())).unwrap();
        registry.register(Box::new(errors_total.clone())).unwrap();

        Self {
            registry,
            requests_total,
            event_types_total,
            errors_total,
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

impl Default for IngressMetrics {
    fn default() -> Self {
        Self::new()
    }
}
