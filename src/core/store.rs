//! File-backed configuration store.

use crate::core::ConfigTree;
use crate::error::{ConfigError, Result};
use arc_swap::ArcSwap;
use config::{File, FileFormat, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns the loaded configuration tree and its on-disk location.
///
/// The current tree sits behind an `ArcSwap`, so a reload replaces it in one
/// step and readers see either the old or the new snapshot in full.
///
/// The format is detected from the file extension:
/// - `.yaml`, `.yml` -> YAML
/// - `.toml` -> TOML
/// - `.json` -> JSON
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_configurator::core::ConfigStore;
///
/// # fn example() -> hotswap_configurator::error::Result<()> {
/// let store = ConfigStore::open("config/app.yaml")?;
/// let server = store.sub_tree("server");
/// # Ok(())
/// # }
/// ```
pub struct ConfigStore {
    path: PathBuf,
    format: FileFormat,
    current: ArcSwap<ConfigTree>,
}

impl ConfigStore {
    /// Resolve, parse and hold the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path cannot be made absolute or is not an existing file
    ///   ([`ConfigError::PathResolutionError`])
    /// - The extension is unsupported or the content is malformed
    ///   ([`ConfigError::ParseError`])
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_path(path.as_ref())?;
        let format = detect_format(&path)?;
        let tree = load_tree(&path, format)?;

        tracing::info!(
            path = %path.display(),
            sections = tree.len(),
            "configuration loaded"
        );

        Ok(Self {
            path,
            format,
            current: ArcSwap::from_pointee(tree),
        })
    }

    /// Absolute path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the configuration file; this is what gets watched.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// The sub-tree under top-level key `name`, or an empty tree if absent.
    pub fn sub_tree(&self, name: &str) -> ConfigTree {
        self.current.load().sub_tree(name)
    }

    /// The current full snapshot.
    pub fn snapshot(&self) -> Arc<ConfigTree> {
        self.current.load_full()
    }

    /// Re-read the file and swap in the new tree.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<ConfigTree>> {
        let tree = Arc::new(load_tree(&self.path, self.format)?);
        self.current.store(Arc::clone(&tree));
        Ok(tree)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| {
        ConfigError::PathResolutionError(format!("{}: {}", path.display(), e))
    })?;

    let metadata = std::fs::metadata(&absolute).map_err(|e| {
        ConfigError::PathResolutionError(format!("{}: {}", absolute.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(ConfigError::PathResolutionError(format!(
            "{} is not a regular file",
            absolute.display()
        )));
    }

    Ok(absolute)
}

fn detect_format(path: &Path) -> Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            ConfigError::ParseError(format!(
                "Unable to determine file format for: {}",
                path.display()
            ))
        })?;

    match extension {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
            extension
        ))),
    }
}

fn load_tree(path: &Path, format: FileFormat) -> Result<ConfigTree> {
    // The file may have been removed since the last load.
    if !path.is_file() {
        return Err(ConfigError::PathResolutionError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let parsed = config::Config::builder()
        .add_source(File::from(path).format(format).required(true))
        .build()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let root = parsed
        .try_deserialize::<Map<String, Value>>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(ConfigTree::new(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_format() {
        assert!(matches!(detect_format(Path::new("a.yaml")), Ok(FileFormat::Yaml)));
        assert!(matches!(detect_format(Path::new("a.yml")), Ok(FileFormat::Yaml)));
        assert!(matches!(detect_format(Path::new("a.toml")), Ok(FileFormat::Toml)));
        assert!(matches!(detect_format(Path::new("a.json")), Ok(FileFormat::Json)));
        assert!(matches!(
            detect_format(Path::new("a.txt")),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            detect_format(Path::new("config")),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_open_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "app.yaml",
            "server:\n  port: 8080\ndatabase:\n  url: postgres://localhost/db\n",
        );

        let store = ConfigStore::open(&path).unwrap();
        assert!(store.path().is_absolute());
        assert_eq!(store.directory(), path.parent().unwrap());

        let port: Option<u16> = store.sub_tree("server").get("port").unwrap();
        assert_eq!(port, Some(8080));
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_open_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.toml", "[server]\nport = 9090\n");

        let store = ConfigStore::open(&path).unwrap();
        let port: Option<u16> = store.sub_tree("server").get("port").unwrap();
        assert_eq!(port, Some(9090));
    }

    #[test]
    fn test_open_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"server": {"host": "0.0.0.0"}}"#);

        let store = ConfigStore::open(&path).unwrap();
        let host: Option<String> = store.sub_tree("server").get("host").unwrap();
        assert_eq!(host.as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn test_open_missing_file() {
        let result = ConfigStore::open("/nonexistent/config.yaml");
        assert!(matches!(result, Err(ConfigError::PathResolutionError(_))));
    }

    #[test]
    fn test_open_directory() {
        let dir = TempDir::new().unwrap();
        let result = ConfigStore::open(dir.path());
        assert!(matches!(result, Err(ConfigError::PathResolutionError(_))));
    }

    #[test]
    fn test_open_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", "{ not json");

        let result = ConfigStore::open(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.yaml", "a:\n  v: 1\n");
        let store = ConfigStore::open(&path).unwrap();
        let before = store.snapshot();

        fs::write(&path, "a:\n  v: 2\n").unwrap();
        store.reload().unwrap();

        let v: Option<i64> = store.sub_tree("a").get("v").unwrap();
        assert_eq!(v, Some(2));

        // Snapshots taken earlier are untouched.
        let old: Option<i64> = before.sub_tree("a").get("v").unwrap();
        assert_eq!(old, Some(1));
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"a": {"v": 1}}"#);
        let store = ConfigStore::open(&path).unwrap();

        fs::write(&path, "{ broken").unwrap();
        assert!(matches!(store.reload(), Err(ConfigError::ParseError(_))));

        fs::remove_file(&path).unwrap();
        assert!(matches!(
            store.reload(),
            Err(ConfigError::PathResolutionError(_))
        ));

        let v: Option<i64> = store.sub_tree("a").get("v").unwrap();
        assert_eq!(v, Some(1));
    }
}
