use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use tracing::warn;

use crate::notifications::{AggregateNotificationState, CategoryId};

/// Metric name prefix for all notifier metrics
const PREFIX: &str = "globalt";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref POLL_CYCLES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_poll_cycles_total"),
        "Completed notification poll cycles"
    ).expect("Failed to create poll_cycles_total metric");

    pub static ref FETCH_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_fetch_failures_total"), "Category fetches that ended in an error"),
        &["category", "kind"]
    ).expect("Failed to create fetch_failures_total metric");

    pub static ref FETCH_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_fetch_duration_seconds"),
            "Category fetch duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["category"]
    ).expect("Failed to create fetch_duration_seconds metric");

    pub static ref UNSEEN_NOTIFICATIONS: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_unseen_notifications"), "New records per category after the last poll"),
        &["category"]
    ).expect("Failed to create unseen_notifications metric");

    pub static ref WATERMARK_WRITE_FAILURES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_watermark_write_failures_total"),
        "Failed writes to the local watermark store"
    ).expect("Failed to create watermark_write_failures_total metric");
}

/// Registers every metric with the registry. Safe to call more than once.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(POLL_CYCLES_TOTAL.clone()),
        Box::new(FETCH_FAILURES_TOTAL.clone()),
        Box::new(FETCH_DURATION_SECONDS.clone()),
        Box::new(UNSEEN_NOTIFICATIONS.clone()),
        Box::new(WATERMARK_WRITE_FAILURES_TOTAL.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => warn!("Failed to register metric: {}", e),
        }
    }
}

pub fn record_fetch(category: CategoryId, duration: Duration, failure: Option<&str>) {
    FETCH_DURATION_SECONDS
        .with_label_values(&[category.as_str()])
        .observe(duration.as_secs_f64());
    if let Some(kind) = failure {
        FETCH_FAILURES_TOTAL
            .with_label_values(&[category.as_str(), kind])
            .inc();
    }
}

pub fn record_poll(state: &AggregateNotificationState) {
    POLL_CYCLES_TOTAL.inc();
    for delta in &state.counts {
        UNSEEN_NOTIFICATIONS
            .with_label_values(&[delta.category.as_str()])
            .set(delta.count as f64);
    }
}

pub fn record_watermark_write_failure() {
    WATERMARK_WRITE_FAILURES_TOTAL.inc();
}

/// Renders the registry in the Prometheus text exposition format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::DeltaCount;

    #[test]
    fn test_render_includes_recorded_poll() {
        init_metrics();
        init_metrics();

        record_poll(&AggregateNotificationState {
            counts: vec![DeltaCount {
                category: CategoryId::ReportCards,
                count: 3,
            }],
            total: 3,
            entries: vec![],
        });
        record_fetch(CategoryId::Messages, Duration::from_millis(20), Some("status"));

        let text = render();
        assert!(text.contains("globalt_poll_cycles_total"));
        assert!(text.contains("globalt_unseen_notifications{category=\"reportCards\"}"));
        assert!(text.contains("globalt_fetch_failures_total{category=\"messages\",kind=\"status\"}"));
    }
}
