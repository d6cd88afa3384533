// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Prometheus metrics for dispatched method calls.

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

/// Metrics for monitoring dispatch outcomes and open handles.
#[derive(Clone, Debug)]
pub struct DispatchMetrics {
    /// Number of method calls handled, labeled by method name and status
    pub operations_total: IntCounterVec,
    /// Method call duration in seconds, labeled by method name
    pub operation_duration: HistogramVec,
    /// Number of database handles currently registered
    pub open_databases: IntGauge,
}

impl DispatchMetrics {
    /// Create new metrics and register them with the given Prometheus registry.
    ///
    /// # Arguments
    /// * `prefix` - Prefix for metric names (e.g., "sqlbridge")
    /// * `registry` - Prometheus registry to register metrics with
    pub fn new(prefix: &str, registry: &Registry) -> Result<Self, prometheus::Error> {
        let operations_total = IntCounterVec::new(
            Opts::new(
                format!("{prefix}_operations_total"),
                "Total number of method calls handled",
            ),
            &["method", "status"], // method name, "success", "error" or "not_implemented"
        )?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                format!("{prefix}_operation_duration_seconds"),
                "Duration of method calls, including the permission check",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
            ]),
            &["method"],
        )?;

        let open_databases = IntGauge::with_opts(Opts::new(
            format!("{prefix}_open_databases"),
            "Number of open database handles",
        ))?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(operation_duration.clone()))?;
        registry.register(Box::new(open_databases.clone()))?;

        Ok(DispatchMetrics {
            operations_total,
            operation_duration,
            open_databases,
        })
    }
}
