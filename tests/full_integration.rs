//! Integration tests driving dispatch through real file writes.

use hotswap_configurator::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{Instant, sleep};

const FILE_LEN: usize = 512;

/// Overwrite in place with content padded to a fixed length, so each
/// rewrite is a single write syscall that leaves no trailing bytes behind.
fn rewrite(path: &Path, content: &str) {
    assert!(content.len() <= FILE_LEN);
    let padded = format!("{}{}", content, "\n".repeat(FILE_LEN - content.len()));

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .unwrap();
    file.write_all(padded.as_bytes()).unwrap();
}

fn setup(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    rewrite(&path, content);
    (temp_dir, path)
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Records every version string delivered for a section.
#[derive(Clone, Default)]
struct Versions(Arc<Mutex<Vec<Option<String>>>>);

impl Versions {
    fn register(&self, configurator: &Configurator, name: &str) {
        let seen = Arc::clone(&self.0);
        configurator.add_fn(name, move |section| {
            let version: Option<String> = section.get("version").unwrap();
            seen.lock().unwrap().push(version);
        });
    }

    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn all(&self) -> Vec<Option<String>> {
        self.0.lock().unwrap().clone()
    }

    fn last(&self) -> Option<String> {
        self.0.lock().unwrap().last().cloned().flatten()
    }
}

#[tokio::test]
async fn test_write_triggers_dispatch() {
    let (_dir, path) = setup("a:\n  version: v1\n");
    let configurator = Configurator::new(&path).unwrap();

    let a = Versions::default();
    a.register(&configurator, "a");
    assert_eq!(a.all(), vec![Some("v1".to_string())]);

    rewrite(&path, "a:\n  version: v2\n");

    assert!(wait_for(|| a.count() == 2).await);
    assert_eq!(a.last().as_deref(), Some("v2"));
    assert_eq!(configurator.sub_tree("a").get::<String>("version").unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_writes_more_than_a_second_apart_both_dispatch() {
    let (_dir, path) = setup("a:\n  version: v1\n");
    let configurator = Configurator::new(&path).unwrap();

    let a = Versions::default();
    a.register(&configurator, "a");

    rewrite(&path, "a:\n  version: v2\n");
    assert!(wait_for(|| a.count() == 2).await);

    sleep(Duration::from_millis(1200)).await;
    rewrite(&path, "a:\n  version: v3\n");
    assert!(wait_for(|| a.count() == 3).await);

    assert_eq!(
        a.all(),
        vec![
            Some("v1".to_string()),
            Some("v2".to_string()),
            Some("v3".to_string())
        ]
    );
    assert_eq!(configurator.reload_status().dispatch_cycles, 2);
}

#[tokio::test]
async fn test_burst_of_writes_dispatches_once() {
    let (_dir, path) = setup("x:\n  version: v1\ny:\n  version: v1\n");
    let configurator = Configurator::new(&path).unwrap();

    let x = Versions::default();
    let y = Versions::default();
    x.register(&configurator, "x");
    y.register(&configurator, "y");

    rewrite(&path, "x:\n  version: v2\ny:\n  version: v2\n");
    assert!(wait_for(|| x.count() == 2).await);

    sleep(Duration::from_millis(100)).await;
    rewrite(&path, "x:\n  version: v3\ny:\n  version: v3\n");
    assert!(wait_for(|| configurator.reload_status().discarded_events >= 1).await);

    assert_eq!(x.count(), 2);
    assert_eq!(y.count(), 2);
    assert_eq!(configurator.reload_status().dispatch_cycles, 1);
}

#[tokio::test]
async fn test_unchanged_section_is_redelivered() {
    let (_dir, path) = setup("a:\n  version: v1\nb:\n  version: v1\n");
    let configurator = Configurator::new(&path).unwrap();

    let a = Versions::default();
    a.register(&configurator, "a");

    rewrite(&path, "a:\n  version: v1\nb:\n  version: v2\n");

    assert!(wait_for(|| a.count() == 2).await);
    assert_eq!(a.all(), vec![Some("v1".to_string()), Some("v1".to_string())]);
}

#[tokio::test]
async fn test_reload_failure_is_reported_and_recovered() {
    let (_dir, path) = setup("a:\n  version: v1\n");
    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = Arc::clone(&errors);

    let configurator = Configurator::builder(&path)
        .on_reload_error(move |e| errors_clone.lock().unwrap().push(e.to_string()))
        .build()
        .unwrap();

    let a = Versions::default();
    a.register(&configurator, "a");

    rewrite(&path, "a: [unclosed\n");
    assert!(wait_for(|| configurator.last_reload_failed()).await);
    assert_eq!(a.count(), 1);
    assert_eq!(errors.lock().unwrap().len(), 1);

    // The failed attempt did not start a debounce window.
    rewrite(&path, "a:\n  version: v2\n");
    assert!(wait_for(|| a.count() == 2).await);
    assert_eq!(a.last().as_deref(), Some("v2"));
    assert!(!configurator.last_reload_failed());
}

#[tokio::test]
async fn test_rename_replacement_is_not_picked_up() {
    let (dir, path) = setup("a:\n  version: v1\n");
    let configurator = Configurator::new(&path).unwrap();

    let a = Versions::default();
    a.register(&configurator, "a");

    let staged = dir.path().join("config.yaml.tmp");
    fs::write(&staged, "a:\n  version: v2\n").unwrap();
    fs::rename(&staged, &path).unwrap();

    sleep(Duration::from_millis(500)).await;
    assert_eq!(a.count(), 1);
    assert_eq!(configurator.reload_status().dispatch_cycles, 0);
}

#[tokio::test]
async fn test_dropping_configurator_stops_dispatch() {
    let (_dir, path) = setup("a:\n  version: v1\n");
    let configurator = Configurator::new(&path).unwrap();

    let a = Versions::default();
    a.register(&configurator, "a");
    drop(configurator);

    rewrite(&path, "a:\n  version: v2\n");
    sleep(Duration::from_millis(300)).await;
    assert_eq!(a.count(), 1);
}
