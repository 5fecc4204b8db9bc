//! Builder for constructing Configurator instances.

use crate::core::configurator::{Parts, ReloadErrorHook};
use crate::core::{ConfigStore, Configurator};
use crate::error::{ConfigError, Result};
use crate::notify::{DEFAULT_DEBOUNCE, DEFAULT_EVENT_CAPACITY, FileWatcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

#[cfg(feature = "metrics")]
use crate::metrics::DispatchMetrics;

/// Builder for constructing a [`Configurator`].
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_configurator::prelude::*;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let configurator = Configurator::builder("config/app.toml")
///     .with_debounce(Duration::from_millis(500))
///     .on_reload_error(|e| eprintln!("config reload failed: {}", e))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfiguratorBuilder {
    path: PathBuf,
    debounce: Duration,
    event_capacity: usize,
    file_watch: bool,
    error_hook: Option<ReloadErrorHook>,
    #[cfg(feature = "metrics")]
    metrics: Option<DispatchMetrics>,
}

impl ConfiguratorBuilder {
    /// Create a builder for `path` with default settings.
    ///
    /// Defaults: one second debounce window, event capacity of 100, file
    /// watching on, no reload error hook.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            debounce: DEFAULT_DEBOUNCE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            file_watch: true,
            error_hook: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Minimum interval between accepted write events.
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Capacity of the write-event channel. Events beyond it are dropped.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Enable or disable the filesystem watch.
    ///
    /// Without a watch the configurator only changes through
    /// [`Configurator::reload`], and no tokio runtime is required.
    pub fn with_file_watch(mut self, enabled: bool) -> Self {
        self.file_watch = enabled;
        self
    }

    /// Callback invoked with every reload failure.
    ///
    /// Runs on the thread that attempted the reload, before
    /// [`Configurator::reload`] returns or the write event is dropped.
    pub fn on_reload_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ConfigError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Record reload and dispatch metrics on `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(DispatchMetrics::new(meter));
        self
    }

    /// Load the file and, if enabled, arm the watch.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path cannot be resolved ([`ConfigError::PathResolutionError`])
    /// - The file cannot be parsed ([`ConfigError::ParseError`])
    /// - Watching is enabled and the watch cannot be armed or there is no
    ///   current tokio runtime ([`ConfigError::WatchSetupError`])
    pub fn build(self) -> Result<Configurator> {
        let store = ConfigStore::open(&self.path)?;

        let (watcher, listener) = if self.file_watch {
            let runtime = Handle::try_current().map_err(|e| {
                ConfigError::WatchSetupError(format!(
                    "No tokio runtime to host the configuration listener: {}",
                    e
                ))
            })?;
            let (watcher, events) = FileWatcher::new(store.path(), self.event_capacity)?;
            (Some(watcher), Some((runtime, events)))
        } else {
            (None, None)
        };

        let configurator = Configurator::assemble(Parts {
            store,
            watcher,
            debounce: self.debounce,
            error_hook: self.error_hook,
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        });

        if let Some((runtime, events)) = listener {
            configurator.spawn_listener(&runtime, events);
        }

        tracing::info!(
            path = %configurator.path().display(),
            watching = configurator.is_watching(),
            debounce_ms = self.debounce.as_millis() as u64,
            "configurator ready"
        );

        Ok(configurator)
    }
}
