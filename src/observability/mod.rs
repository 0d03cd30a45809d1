//! # Observability
//!
//! Prometheus metrics for status commits and readiness evaluations.
//! Logging goes through `tracing`; binaries install the subscriber.

pub mod metrics;
