//! # hotswap-configurator
//!
//! File-backed configuration with per-section hot-reload dispatch.
//!
//! ## Overview
//!
//! `hotswap-configurator` loads one configuration file (YAML, TOML or JSON),
//! hands each registered consumer the top-level section named after it, and
//! pushes fresh sections to every consumer when the file is written on disk:
//! - Sections are delivered once at registration and again on every reload
//! - Writes within one second of the last accepted one refresh the snapshot
//!   but are not dispatched
//! - Readers always see a complete snapshot, swapped atomically via `arc-swap`
//! - Reload failures keep the previous snapshot and are reported, not dispatched
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_configurator::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, Default)]
//! #[serde(default)]
//! struct ServerConfig {
//!     port: u16,
//!     host: String,
//! }
//!
//! struct Server;
//!
//! impl Consumer for Server {
//!     fn name(&self) -> &str {
//!         "server"
//!     }
//!
//!     fn on_change(&self, section: ConfigTree) {
//!         let cfg: ServerConfig = section.try_deserialize().unwrap_or_default();
//!         println!("listening on {}:{}", cfg.host, cfg.port);
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let configurator = Configurator::new("config/app.yaml")?;
//! configurator.add(Server);
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitations
//!
//! Only in-place writes trigger a reload. Editors and tools that replace the
//! file through a rename are not picked up.
//!
//! ## Feature Flags
//!
//! - `metrics`: OpenTelemetry counters for reloads, dispatch cycles and
//!   debounced events.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        ConfigTree, Configurator, ConfiguratorBuilder, Consumer, FnConsumer, ReloadStatus,
    };
    pub use crate::error::{ConfigError, Result};
}
