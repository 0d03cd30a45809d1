//! # Metrics
//!
//! Counters for optimistic-concurrency commits and readiness derivations.
//!
//! Metrics live on a process registry. An embedding reconciler calls
//! [`register_metrics`] once at startup and serves [`render`] (or gathers
//! [`registry`] itself) from its metrics endpoint. `tcpctl refresh --metrics`
//! prints the same exposition after a single commit.

use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static STATUS_COMMITS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tcp_status_commits_total",
        "Total number of TenantControlPlane objects committed (status or spec)",
    )
    .expect("Failed to create STATUS_COMMITS_TOTAL metric - this should never happen")
});

static COMMIT_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tcp_commit_conflicts_total",
        "Total number of commits rejected because the resource version changed",
    )
    .expect("Failed to create COMMIT_CONFLICTS_TOTAL metric - this should never happen")
});

static COMMIT_RETRIES_EXHAUSTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tcp_commit_retries_exhausted_total",
        "Total number of commits abandoned after every attempt conflicted",
    )
    .expect("Failed to create COMMIT_RETRIES_EXHAUSTED_TOTAL metric - this should never happen")
});

static COMMIT_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "tcp_commit_duration_seconds",
            "Duration of a commit including conflict retries, in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create COMMIT_DURATION metric - this should never happen")
});

static READINESS_EVALUATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "tcp_readiness_evaluations_total",
            "Total number of readiness derivations by resulting version status",
        ),
        &["status"],
    )
    .expect("Failed to create READINESS_EVALUATIONS_TOTAL metric - this should never happen")
});

/// Register every metric on the process registry. Call once.
pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(STATUS_COMMITS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMMIT_CONFLICTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMMIT_RETRIES_EXHAUSTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COMMIT_DURATION.clone()))?;
    REGISTRY.register(Box::new(READINESS_EVALUATIONS_TOTAL.clone()))?;
    Ok(())
}

pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Registered metrics in the Prometheus text exposition format
pub fn render() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub fn increment_status_commits_total() {
    STATUS_COMMITS_TOTAL.inc();
}

pub fn increment_commit_conflicts_total() {
    COMMIT_CONFLICTS_TOTAL.inc();
}

pub fn increment_commit_retries_exhausted_total() {
    COMMIT_RETRIES_EXHAUSTED_TOTAL.inc();
}

pub fn observe_commit_duration(duration: f64) {
    COMMIT_DURATION.observe(duration);
}

pub fn increment_readiness_evaluations_total(status: &str) {
    READINESS_EVALUATIONS_TOTAL
        .with_label_values(&[status])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_counter_by_status() {
        let before = READINESS_EVALUATIONS_TOTAL
            .with_label_values(&["Upgrading"])
            .get();
        increment_readiness_evaluations_total("Upgrading");
        let after = READINESS_EVALUATIONS_TOTAL
            .with_label_values(&["Upgrading"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_render_exposes_registered_metrics() {
        register_metrics().unwrap();
        increment_status_commits_total();
        increment_readiness_evaluations_total("Ready");

        let text = render().unwrap();
        assert!(text.contains("# TYPE tcp_status_commits_total counter"));
        assert!(text.contains("tcp_readiness_evaluations_total{status=\"Ready\"}"));
        assert!(text.contains("tcp_commit_duration_seconds_bucket"));
    }

    #[test]
    fn test_conflict_counter_increments() {
        let before = COMMIT_CONFLICTS_TOTAL.get();
        increment_commit_conflicts_total();
        assert!(COMMIT_CONFLICTS_TOTAL.get() > before);
    }
}
