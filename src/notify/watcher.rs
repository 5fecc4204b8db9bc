//! File watching for configuration write events.

use crate::error::{ConfigError, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default capacity of the write-event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// A content write to the watched configuration file.
#[derive(Debug, Clone)]
pub struct WriteEvent {
    /// Path reported by the platform watcher.
    pub path: PathBuf,
    /// When the event was received from the platform watcher.
    pub at: Instant,
}

/// Watches one configuration file for in-place writes.
///
/// The containing directory is watched non-recursively and events are
/// filtered down to content writes on the configured file name. Renames,
/// removals, creations and metadata changes are ignored, so a file replaced
/// through an atomic rename-swap does not produce a [`WriteEvent`].
///
/// Events are delivered over a bounded channel. When the channel is full,
/// further events are dropped rather than queued.
///
/// Dropping the watcher stops the platform watch and closes the channel.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_configurator::notify::FileWatcher;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (_watcher, mut rx) = FileWatcher::new(Path::new("/etc/app/config.yaml"), 100)?;
///
/// while let Some(event) = rx.recv().await {
///     println!("{} written", event.path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    file: PathBuf,
    directory: PathBuf,
    capacity: usize,
}

impl FileWatcher {
    /// Arm a watch on the directory containing `file`.
    ///
    /// # Arguments
    ///
    /// * `file` - Absolute path of the configuration file
    /// * `capacity` - Size of the event channel; values below 1 are raised to 1
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WatchSetupError`] if the path has no parent
    /// directory or file name, or if the platform watcher cannot be created
    /// or armed.
    pub fn new(file: &Path, capacity: usize) -> Result<(Self, mpsc::Receiver<WriteEvent>)> {
        let directory = file
            .parent()
            .ok_or_else(|| {
                ConfigError::WatchSetupError(format!(
                    "No parent directory to watch for: {}",
                    file.display()
                ))
            })?
            .to_path_buf();

        let target: OsString = file
            .file_name()
            .ok_or_else(|| {
                ConfigError::WatchSetupError(format!("No file name in: {}", file.display()))
            })?
            .to_os_string();

        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => forward_write(&tx, &target, event),
            Err(e) => tracing::warn!(error = %e, "file watch error"),
        })
        .map_err(|e| ConfigError::WatchSetupError(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::WatchSetupError(format!(
                    "Failed to watch {}: {}",
                    directory.display(),
                    e
                ))
            })?;

        tracing::debug!(
            file = %file.display(),
            directory = %directory.display(),
            capacity,
            "configuration watch armed"
        );

        Ok((
            Self {
                _watcher: watcher,
                file: file.to_path_buf(),
                directory,
                capacity,
            },
            rx,
        ))
    }

    /// The watched configuration file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The directory the platform watch is armed on.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Capacity of the event channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Whether an event kind is an in-place content write.
pub fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

fn forward_write(tx: &mpsc::Sender<WriteEvent>, target: &OsStr, event: Event) {
    if !is_write(&event.kind) {
        return;
    }

    let Some(path) = event
        .paths
        .into_iter()
        .find(|path| path.file_name() == Some(target))
    else {
        return;
    };

    match tx.try_send(WriteEvent {
        path,
        at: Instant::now(),
    }) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            tracing::debug!(path = %event.path.display(), "event channel full, dropping write event");
        }
        Err(TrySendError::Closed(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[test]
    fn test_is_write() {
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(is_write(&EventKind::Modify(ModifyKind::Any)));

        assert!(!is_write(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_write(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Permissions
        ))));
        assert!(!is_write(&EventKind::Create(CreateKind::File)));
        assert!(!is_write(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_forward_filters_by_name_and_kind() {
        let (tx, mut rx) = mpsc::channel(10);
        let target = OsStr::new("app.yaml");
        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        forward_write(&tx, target, Event::new(write).add_path("/cfg/other.yaml".into()));
        forward_write(
            &tx,
            target,
            Event::new(EventKind::Remove(RemoveKind::File)).add_path("/cfg/app.yaml".into()),
        );
        assert!(rx.try_recv().is_err());

        forward_write(&tx, target, Event::new(write).add_path("/cfg/app.yaml".into()));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.path, PathBuf::from("/cfg/app.yaml"));
    }

    #[test]
    fn test_forward_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let target = OsStr::new("app.yaml");
        let write = EventKind::Modify(ModifyKind::Any);

        for _ in 0..5 {
            forward_write(&tx, target, Event::new(write).add_path("/cfg/app.yaml".into()));
        }

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_watch_nonexistent_directory() {
        let result = FileWatcher::new(Path::new("/nonexistent/dir/config.yaml"), 10);
        assert!(matches!(result, Err(ConfigError::WatchSetupError(_))));
    }

    #[tokio::test]
    async fn test_capacity_floor() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "port: 8080").unwrap();

        let (watcher, _rx) = FileWatcher::new(&config_path, 0).unwrap();
        assert_eq!(watcher.capacity(), 1);
        assert_eq!(watcher.directory(), temp_dir.path());
        assert_eq!(watcher.file(), config_path);
    }

    #[tokio::test]
    async fn test_file_write_produces_event() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "port: 8080").unwrap();

        let (_watcher, mut rx) = FileWatcher::new(&config_path, 10).unwrap();

        let path = config_path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fs::write(&path, "port: 9090").unwrap();
        });

        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.path.file_name(), config_path.file_name());
    }

    #[tokio::test]
    async fn test_sibling_write_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let sibling = temp_dir.path().join("notes.txt");
        fs::write(&config_path, "port: 8080").unwrap();
        fs::write(&sibling, "hello").unwrap();

        let (_watcher, mut rx) = FileWatcher::new(&config_path, 10).unwrap();
        fs::write(&sibling, "hello again").unwrap();

        let result = timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(result.is_err());
    }
}
