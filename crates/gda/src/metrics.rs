/// Metrics of the auction engine.
#[derive(prometheus_metric_storage::MetricStorage)]
#[metric(subsystem = "gda")]
pub struct Metrics {
    /// Settled bids by outcome, or by error kind for refused bids.
    #[metric(labels("result"))]
    pub bids: prometheus::IntCounterVec,
    /// Auction lifecycle transitions.
    #[metric(labels("event"))]
    pub auctions: prometheus::IntCounterVec,
    /// Time spent settling a single bid.
    #[metric(buckets(0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05))]
    pub settlement_time: prometheus::Histogram,
}

impl Metrics {
    /// Returns a guard that records the settlement time when it gets dropped.
    #[must_use]
    pub fn on_settlement_start(&self) -> impl Drop + use<> {
        let timer = self.settlement_time.start_timer();
        scopeguard::guard(timer, |timer| timer.observe_duration())
    }
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
