//! Built-in metrics for reload and dispatch activity.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Reload success/failures and duration
//! - Dispatch cycles and per-consumer deliveries
//! - Write events discarded by the debounce window
//! - Registered consumers
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_configurator::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let configurator = Configurator::builder("config.yaml")
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod dispatch_metrics;

pub use dispatch_metrics::DispatchMetrics;
