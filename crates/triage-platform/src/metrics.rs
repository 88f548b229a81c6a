use prometheus::{CounterVec, Histogram, HistogramOpts, Opts};

/// Instrumentation for `PlatformClient` calls, registered into whichever
/// stage's `StageMetrics` registry talks to the platform API. Grounded in
/// the teacher's `AthenaClient`/`SqsConsumer` pairing of a latency
/// histogram with an outcome-labelled counter.
pub struct PlatformMetrics {
    pub call_duration: Histogram,
    pub calls_total: CounterVec,
}

impl PlatformMetrics {
    pub fn new() -> Self {
        let call_duration = Histogram::with_opts(HistogramOpts::new(
            "platform_api_call_duration_seconds",
            "platform API call latency, including retries",
        ))
        .expect("valid metric");
        let calls_total = CounterVec::new(
            Opts::new("platform_api_calls_total", "platform API calls by outcome"),
            &["outcome"],
        )
        .expect("valid metric");
        Self { call_duration, calls_total }
    }

    pub fn observe(&self, outcome: &str, elapsed_secs: f64) {
        self.call_duration.observe(elapsed_secs);
        self.calls_total.with_label_values(&[outcome]).inc();
    }
}

impl Default for PlatformMetrics {
    fn default() -> Self {
        Self::new()
    }
}
