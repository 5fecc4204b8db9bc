//! Dispatch metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for reload and dispatch activity.
///
/// Tracks accepted dispatch cycles, debounced events, reload failures and
/// latencies, and the number of registered consumers.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_configurator::metrics::DispatchMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("hotswap-configurator");
/// let metrics = DispatchMetrics::new(meter);
///
/// let timer = metrics.start_reload();
/// // ... reload the file ...
/// metrics.record_reload_success(timer);
/// metrics.record_dispatch(3);
/// ```
#[derive(Clone)]
pub struct DispatchMetrics {
    reload_success: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    dispatch_cycles: Counter<u64>,
    deliveries: Counter<u64>,
    debounced_events: Counter<u64>,
    registered_consumers: Gauge<i64>,
}

impl DispatchMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let reload_success = meter
            .u64_counter("hotswap_configurator.reload.success")
            .with_description("Number of successful reloads")
            .build();

        let reload_failures = meter
            .u64_counter("hotswap_configurator.reload.failures")
            .with_description("Number of reloads that failed to read or parse the file")
            .build();

        let reload_duration = meter
            .f64_histogram("hotswap_configurator.reload.duration")
            .with_description("Duration of reload operations in seconds")
            .with_unit("s")
            .build();

        let dispatch_cycles = meter
            .u64_counter("hotswap_configurator.dispatch.cycles")
            .with_description("Number of dispatch cycles run")
            .build();

        let deliveries = meter
            .u64_counter("hotswap_configurator.dispatch.deliveries")
            .with_description("Number of sections delivered to consumers")
            .build();

        let debounced_events = meter
            .u64_counter("hotswap_configurator.events.debounced")
            .with_description("Write events discarded inside the debounce window")
            .build();

        let registered_consumers = meter
            .i64_gauge("hotswap_configurator.consumers.registered")
            .with_description("Number of registered consumers")
            .build();

        Self {
            reload_success,
            reload_failures,
            reload_duration,
            dispatch_cycles,
            deliveries,
            debounced_events,
            registered_consumers,
        }
    }

    /// Start a reload timer.
    ///
    /// Pass the returned `Instant` to `record_reload_success` or
    /// `record_reload_failure`.
    pub fn start_reload(&self) -> Instant {
        Instant::now()
    }

    /// Record a successful reload.
    pub fn record_reload_success(&self, start: Instant) {
        self.reload_success.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a failed reload.
    pub fn record_reload_failure(&self, start: Instant) {
        self.reload_failures.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record one dispatch cycle that delivered to `consumers` consumers.
    pub fn record_dispatch(&self, consumers: usize) {
        self.dispatch_cycles.add(1, &[]);
        self.deliveries.add(consumers as u64, &[]);
    }

    /// Record a write event discarded by the debounce window.
    pub fn record_debounced(&self) {
        self.debounced_events.add(1, &[]);
    }

    /// Update the registered consumer count.
    pub fn update_consumer_count(&self, count: usize) {
        self.registered_consumers.record(count as i64, &[]);
    }
}
