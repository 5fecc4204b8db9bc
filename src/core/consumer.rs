//! The consumer contract for configuration sections.

use crate::core::ConfigTree;

/// A component that wants one top-level section of the configuration.
///
/// [`name`](Consumer::name) must match a top-level key of the configuration
/// file. [`on_change`](Consumer::on_change) receives that section once at
/// registration and again after every accepted reload, whether or not the
/// section itself changed. Uniqueness of names is up to the caller.
///
/// Callbacks run synchronously on the dispatching thread; a slow callback
/// delays every consumer registered after it.
///
/// # Examples
///
/// ```rust
/// use hotswap_configurator::core::{ConfigTree, Consumer};
/// use parking_lot::Mutex;
///
/// struct Server {
///     port: Mutex<u16>,
/// }
///
/// impl Consumer for Server {
///     fn name(&self) -> &str {
///         "server"
///     }
///
///     fn on_change(&self, section: ConfigTree) {
///         let port = section.get::<u16>("port").ok().flatten().unwrap_or(8080);
///         *self.port.lock() = port;
///     }
/// }
/// ```
pub trait Consumer: Send + Sync {
    /// Top-level key this consumer's section lives under.
    fn name(&self) -> &str;

    /// Receive the current section. Absent sections arrive as an empty tree.
    fn on_change(&self, section: ConfigTree);
}

/// Adapter turning a `(name, closure)` pair into a [`Consumer`].
pub struct FnConsumer<F> {
    name: String,
    callback: F,
}

impl<F> FnConsumer<F>
where
    F: Fn(ConfigTree) + Send + Sync,
{
    /// Create a consumer for section `name`.
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> Consumer for FnConsumer<F>
where
    F: Fn(ConfigTree) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_change(&self, section: ConfigTree) {
        (self.callback)(section)
    }
}
