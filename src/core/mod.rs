//! Core configuration types: the tree, the store, consumers and the configurator.

mod builder;
mod configurator;
mod consumer;
mod store;
mod tree;

pub use builder::ConfiguratorBuilder;
pub use configurator::{Configurator, ReloadErrorHook, ReloadStatus};
pub use consumer::{Consumer, FnConsumer};
pub use store::ConfigStore;
pub use tree::ConfigTree;
