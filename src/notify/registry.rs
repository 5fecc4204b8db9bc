//! Append-only registry of configuration consumers.

use crate::core::Consumer;
use parking_lot::Mutex;
use std::sync::Arc;

/// Registry of consumers, kept in registration order.
///
/// Consumers are only ever appended. Dispatch iterates over a copy taken
/// under the lock, so registering during a dispatch cycle never races with
/// the iteration; the new consumer simply may or may not be in that cycle.
///
/// # Examples
///
/// ```rust
/// use hotswap_configurator::core::FnConsumer;
/// use hotswap_configurator::notify::ConsumerRegistry;
/// use std::sync::Arc;
///
/// let registry = ConsumerRegistry::new();
/// registry.register(Arc::new(FnConsumer::new("server", |_section| {})));
///
/// for consumer in registry.snapshot() {
///     println!("registered: {}", consumer.name());
/// }
/// ```
#[derive(Default)]
pub struct ConsumerRegistry {
    consumers: Mutex<Vec<Arc<dyn Consumer>>>,
}

impl ConsumerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a consumer. Returns the number of registered consumers.
    pub fn register(&self, consumer: Arc<dyn Consumer>) -> usize {
        let mut consumers = self.consumers.lock();
        consumers.push(consumer);
        consumers.len()
    }

    /// Copy of the registered consumers, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Consumer>> {
        self.consumers.lock().clone()
    }

    /// Number of registered consumers.
    pub fn len(&self) -> usize {
        self.consumers.lock().len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.consumers.lock().is_empty()
    }

    /// Registered names, in registration order. Duplicates are kept.
    pub fn names(&self) -> Vec<String> {
        self.consumers
            .lock()
            .iter()
            .map(|consumer| consumer.name().to_string())
            .collect()
    }
}
