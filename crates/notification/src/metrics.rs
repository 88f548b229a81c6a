use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Grounded in the original service's `notification_counter` /
/// `notification_failures_counter`.
pub struct NotificationMetrics {
    registry: Registry,
    pub delivered: IntCounter,
    pub failed: IntCounter,
}

impl NotificationMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let delivered = IntCounter::new("notification_delivered_total", "chat webhook 200 responses")
            .expect("valid metric");
        let failed = IntCounter::new("notification_failed_total", "chat webhook non-200 responses")
            .expect("valid metric");
        registry.register(Box::new(delivered.clone())).unwrap();
        registry.register(Box::new(failed.clone())).unwrap();
        Self { registry, delivered, failed }
    }

    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf).expect("encode metrics");
        String::from_utf8(buf).expect("prometheus output is utf8")
    }
}

impl Default for NotificationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
