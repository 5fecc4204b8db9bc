//! The configurator: section lookup, consumer registration and dispatch.

use crate::core::{ConfigStore, ConfigTree, ConfiguratorBuilder, Consumer, FnConsumer};
use crate::error::{ConfigError, Result};
use crate::notify::{ConsumerRegistry, Debouncer, FileWatcher, WriteEvent};
use parking_lot::{Mutex, ReentrantMutex};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[cfg(feature = "metrics")]
use crate::metrics::DispatchMetrics;

/// Callback invoked when a reload fails.
pub type ReloadErrorHook = Arc<dyn Fn(&ConfigError) + Send + Sync>;

/// Outcome counters and the "last reload failed" flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadStatus {
    /// Message of the most recent reload failure, cleared by the next
    /// successful reload.
    pub last_error: Option<String>,
    /// Total reload failures.
    pub failures: u64,
    /// Total dispatch cycles, including manual reloads.
    pub dispatch_cycles: u64,
    /// Write events inside the debounce window that were not dispatched.
    pub discarded_events: u64,
}

impl ReloadStatus {
    /// Whether the most recent reload attempt failed.
    pub fn last_reload_failed(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Process-wide configuration coordinator.
///
/// Loads one configuration file, hands each registered [`Consumer`] its
/// named top-level section, and re-delivers every consumer's section after
/// the file is written on disk. Writes arriving within the debounce window
/// (one second by default) of the last accepted one still refresh the
/// snapshot, but are not dispatched.
///
/// The configurator is cheap to clone; clones share the same store,
/// registry and watch. Create it once at the composition root and pass it
/// to whatever needs live configuration. The watch stops when the last
/// clone is dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_configurator::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let configurator = Configurator::new("config/app.yaml")?;
///
/// configurator.add_fn("server", |section| {
///     let port: u16 = section.get("port").ok().flatten().unwrap_or(8080);
///     println!("server port is now {}", port);
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Configurator {
    inner: Arc<Inner>,
}

struct Inner {
    store: ConfigStore,
    registry: ConsumerRegistry,
    // Serializes reloads, dispatch cycles and initial deliveries. Reentrant
    // so a consumer may register or reload from inside `on_change`.
    cycle: ReentrantMutex<()>,
    debounce: Duration,
    debouncer: Mutex<Debouncer>,
    status: Mutex<ReloadStatus>,
    error_hook: Option<ReloadErrorHook>,
    #[cfg(feature = "metrics")]
    metrics: Option<DispatchMetrics>,
    // Held for its Drop; closes the event channel.
    watcher: Option<FileWatcher>,
}

/// Everything the builder resolved before the configurator exists.
pub(crate) struct Parts {
    pub(crate) store: ConfigStore,
    pub(crate) watcher: Option<FileWatcher>,
    pub(crate) debounce: Duration,
    pub(crate) error_hook: Option<ReloadErrorHook>,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<DispatchMetrics>,
}

impl Configurator {
    /// Load `path` and start watching it with default settings.
    ///
    /// Must be called from within a tokio runtime, which hosts the listener
    /// task.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path cannot be resolved to an existing file
    ///   ([`ConfigError::PathResolutionError`])
    /// - The file cannot be parsed ([`ConfigError::ParseError`])
    /// - The watch cannot be armed or no runtime is available
    ///   ([`ConfigError::WatchSetupError`])
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Create a builder for a configurator over `path`.
    pub fn builder(path: impl Into<PathBuf>) -> ConfiguratorBuilder {
        ConfiguratorBuilder::new(path)
    }

    pub(crate) fn assemble(parts: Parts) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: parts.store,
                registry: ConsumerRegistry::new(),
                cycle: ReentrantMutex::new(()),
                debounce: parts.debounce,
                debouncer: Mutex::new(Debouncer::new(parts.debounce)),
                status: Mutex::new(ReloadStatus::default()),
                error_hook: parts.error_hook,
                #[cfg(feature = "metrics")]
                metrics: parts.metrics,
                watcher: parts.watcher,
            }),
        }
    }

    /// Run the listener on `runtime` until the event channel closes.
    ///
    /// The task only holds a weak reference, so it does not keep the
    /// configurator alive.
    pub(crate) fn spawn_listener(&self, runtime: &Handle, mut events: mpsc::Receiver<WriteEvent>) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                tracing::trace!(path = %event.path.display(), "configuration write observed");
                inner.on_file_write(event.at);
            }
            tracing::debug!("configuration listener stopped");
        });
    }

    /// Register a consumer and deliver its current section immediately.
    ///
    /// The section is delivered synchronously on the calling thread before
    /// this returns. There is no way to unregister.
    pub fn add<C>(&self, consumer: C)
    where
        C: Consumer + 'static,
    {
        self.add_shared(Arc::new(consumer));
    }

    /// Register a consumer the caller keeps a handle to.
    ///
    /// Waits for a dispatch cycle running on another thread to finish, so the
    /// initial delivery is never older than a section already dispatched.
    pub fn add_shared(&self, consumer: Arc<dyn Consumer>) {
        let _cycle = self.inner.cycle.lock();
        let count = self.inner.registry.register(Arc::clone(&consumer));

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.inner.metrics {
            metrics.update_consumer_count(count);
        }

        tracing::debug!(consumer = consumer.name(), registered = count, "consumer registered");

        consumer.on_change(self.inner.store.sub_tree(consumer.name()));
    }

    /// Register a closure as the consumer of section `name`.
    pub fn add_fn<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(ConfigTree) + Send + Sync + 'static,
    {
        self.add(FnConsumer::new(name, callback));
    }

    /// The current section under top-level key `name`; empty if absent.
    pub fn sub_tree(&self, name: &str) -> ConfigTree {
        self.inner.store.sub_tree(name)
    }

    /// The current full configuration snapshot.
    pub fn snapshot(&self) -> Arc<ConfigTree> {
        self.inner.store.snapshot()
    }

    /// Absolute path of the configuration file.
    pub fn path(&self) -> &Path {
        self.inner.store.path()
    }

    /// Reload the file now and dispatch to every consumer.
    ///
    /// Bypasses the debounce window and leaves it untouched. Waits for a
    /// dispatch cycle running on another thread to finish first.
    ///
    /// # Errors
    ///
    /// Returns the reload failure; it is also recorded in
    /// [`reload_status`](Self::reload_status) and passed to the reload
    /// error hook. Consumers are not notified on failure.
    pub fn reload(&self) -> Result<()> {
        let _cycle = self.inner.cycle.lock();
        let tree = self.inner.reload_tree()?;
        self.inner.dispatch(&tree);
        Ok(())
    }

    /// Counters and the last reload failure, if any.
    pub fn reload_status(&self) -> ReloadStatus {
        self.inner.status.lock().clone()
    }

    /// Whether the most recent reload attempt failed.
    pub fn last_reload_failed(&self) -> bool {
        self.inner.status.lock().last_reload_failed()
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Registered consumer names, in registration order.
    pub fn consumer_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Whether a filesystem watch is armed.
    pub fn is_watching(&self) -> bool {
        self.inner.watcher.is_some()
    }

    /// Minimum interval between accepted write events.
    pub fn debounce_window(&self) -> Duration {
        self.inner.debounce
    }

    /// Handle a write event observed at `at`. Returns whether it led to a
    /// dispatch cycle.
    #[cfg(test)]
    pub(crate) fn handle_write(&self, at: Instant) -> bool {
        self.inner.on_file_write(at)
    }
}

impl std::fmt::Debug for Configurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configurator")
            .field("path", &self.path())
            .field("consumers", &self.consumer_names())
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl Inner {
    /// Re-read the file for every write; dispatch only outside the window.
    fn on_file_write(&self, at: Instant) -> bool {
        let _cycle = self.cycle.lock();

        let ready = self.debouncer.lock().is_ready(at);
        if !ready {
            tracing::debug!("configuration write inside debounce window, not dispatched");
            self.status.lock().discarded_events += 1;
            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.record_debounced();
            }
        }

        // A failed reload does not start a new window.
        let Ok(tree) = self.reload_tree() else {
            return false;
        };
        if !ready {
            return false;
        }
        self.debouncer.lock().record(at);

        self.dispatch(&tree);
        true
    }

    fn reload_tree(&self) -> Result<Arc<ConfigTree>> {
        #[cfg(feature = "metrics")]
        let timer = Instant::now();

        match self.store.reload() {
            Ok(tree) => {
                self.status.lock().last_error = None;
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_reload_success(timer);
                }
                Ok(tree)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "configuration reload failed, keeping previous configuration"
                );
                {
                    let mut status = self.status.lock();
                    status.last_error = Some(e.to_string());
                    status.failures += 1;
                }
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_reload_failure(timer);
                }
                if let Some(hook) = &self.error_hook {
                    hook(&e);
                }
                Err(e)
            }
        }
    }

    /// Deliver each consumer its section of `tree`, in registration order.
    fn dispatch(&self, tree: &ConfigTree) {
        let consumers = self.registry.snapshot();
        tracing::info!(consumers = consumers.len(), "dispatching configuration");

        for consumer in &consumers {
            tracing::trace!(consumer = consumer.name(), "delivering section");
            consumer.on_change(tree.sub_tree(consumer.name()));
        }

        self.status.lock().dispatch_cycles += 1;
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatch(consumers.len());
        }
    }
}
