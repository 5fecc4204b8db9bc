//! Change notification: file watching, debouncing and the consumer registry.
//!
//! These are the building blocks [`Configurator`](crate::core::Configurator)
//! wires together; they are public for hosts that want to compose their own.

pub mod debounce;
pub mod registry;
pub mod watcher;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use registry::ConsumerRegistry;
pub use watcher::{DEFAULT_EVENT_CAPACITY, FileWatcher, WriteEvent};
