//! Immutable configuration tree snapshots.

use crate::error::{ConfigError, Result};
use config::{Map, Value, ValueKind};
use serde::de::DeserializeOwned;

/// An immutable snapshot of a parsed configuration table.
///
/// A tree is either the whole configuration file or one named section of it.
/// Looking up a section that does not exist yields an empty tree, never an
/// error, so consumers can treat absence as "use defaults".
///
/// # Examples
///
/// ```rust,no_run
/// # use hotswap_configurator::prelude::*;
/// # fn example(configurator: &Configurator) -> Result<()> {
/// let server = configurator.sub_tree("server");
/// let port: Option<u16> = server.get("port")?;
/// let tls = server.sub_tree("tls");
/// if tls.is_empty() {
///     println!("TLS disabled");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Create a tree from an already parsed table.
    pub fn new(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the tree has no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of immediate keys.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Whether `key` is an immediate key of this tree.
    pub fn contains_key(&self, key: &str) -> bool {
        lookup(&self.root, key).is_some()
    }

    /// Immediate keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Extract the immediate sub-tree stored under `name`.
    ///
    /// Returns an empty tree when the key is absent or holds a scalar or
    /// array instead of a table.
    pub fn sub_tree(&self, name: &str) -> ConfigTree {
        match lookup(&self.root, name) {
            Some(Value {
                kind: ValueKind::Table(table),
                ..
            }) => ConfigTree::new(table.clone()),
            _ => ConfigTree::empty(),
        }
    }

    /// Raw value at a dot-separated path such as `"pool.max_size"`.
    pub fn value(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = lookup(&self.root, segments.next()?)?;

        for segment in segments {
            match &current.kind {
                ValueKind::Table(table) => current = lookup(table, segment)?,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Deserialize the value at a dot-separated path.
    ///
    /// An absent path is `Ok(None)`. A present value that does not fit `T`
    /// is a [`ConfigError::DeserializationError`].
    pub fn get<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.value(path) else {
            return Ok(None);
        };

        value.clone().try_deserialize::<T>().map(Some).map_err(|e| {
            ConfigError::DeserializationError(format!("Failed to read '{}': {}", path, e))
        })
    }

    /// Deserialize the whole tree into `T`.
    ///
    /// An empty tree deserializes like an empty table, so types with
    /// `#[serde(default)]` fields come back filled with defaults.
    pub fn try_deserialize<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Value::new(None, ValueKind::Table(self.root.clone()))
            .try_deserialize::<T>()
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }
}

/// Case-sensitive lookup with a case-insensitive fallback; some parsers
/// lowercase keys.
fn lookup<'a>(table: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    table.get(key).or_else(|| {
        table
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

impl From<Map<String, Value>> for ConfigTree {
    fn from(root: Map<String, Value>) -> Self {
        Self::new(root)
    }
}
