use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations created.
pub const RESERVATIONS_TOTAL: &str = "innkeep_reservations_total";

/// Counter: booking requests refused. Labels: reason.
pub const RESERVATIONS_REJECTED_TOTAL: &str = "innkeep_reservations_rejected_total";

/// Counter: payment outcomes applied. Labels: outcome.
pub const PAYMENT_OUTCOMES_TOTAL: &str = "innkeep_payment_outcomes_total";

/// Counter: reservations cancelled outside the sweeper. Labels: reason.
pub const CANCELLATIONS_TOTAL: &str = "innkeep_cancellations_total";

// ── Sweeper ─────────────────────────────────────────────────────

/// Counter: PENDING orders reclaimed past their deadline.
pub const SWEEPER_EXPIRED_TOTAL: &str = "innkeep_sweeper_expired_total";

/// Counter: per-order sweep failures deferred to the next cycle.
pub const SWEEPER_ERRORS_TOTAL: &str = "innkeep_sweeper_errors_total";

/// Histogram: duration of one sweep pass in seconds.
pub const SWEEP_DURATION_SECONDS: &str = "innkeep_sweep_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: rooms currently BOOKED.
pub const ROOMS_BOOKED: &str = "innkeep_rooms_booked";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
