use super::format::load_settings;
use super::store::SettingsStore;
use crate::error::{TerrainError, TerrainResult};
use crossbeam_channel::{Receiver, TryRecvError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Reloads a settings file into a `SettingsStore` when it changes on disk.
///
/// Events are collected on the notify thread and applied on `poll()`, so the
/// store is only ever published from the thread that drives the watcher.
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<Instant>,
    path: PathBuf,
    store: Arc<SettingsStore>,
    debounce: Duration,
    last_change: Option<Instant>,
}

impl SettingsWatcher {
    pub fn new(
        path: impl AsRef<Path>,
        store: Arc<SettingsStore>,
        debounce_ms: u64,
    ) -> TerrainResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file_name = path.file_name().map(|name| name.to_os_string());
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            let touches_file = event
                .paths
                .iter()
                .any(|changed| changed.file_name().map(|name| name.to_os_string()) == file_name);
            if touches_file {
                let _ = tx.send(Instant::now());
            }
        })
        .map_err(|e| watch_error(&path, e))?;

        // Watch the directory so editors that replace the file are still seen
        let watch_root = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(watch_root, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(&path, e))?;

        log::info!("[SettingsWatcher] Watching {}", path.display());
        Ok(Self {
            _watcher: watcher,
            rx,
            path,
            store,
            debounce: Duration::from_millis(debounce_ms),
            last_change: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply pending file changes. Returns true if new settings were published.
    ///
    /// A change is applied once no further events arrived for the debounce
    /// window. Load or validation failures are logged and the previous
    /// settings stay live.
    pub fn poll(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(at) => self.last_change = Some(at),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("[SettingsWatcher] Watcher for {} disconnected", self.path.display());
                    break;
                }
            }
        }

        match self.last_change {
            Some(at) if at.elapsed() >= self.debounce => {
                self.last_change = None;
                self.reload_now()
            }
            _ => false,
        }
    }

    /// Reload the file immediately, bypassing the debounce
    pub fn reload_now(&self) -> bool {
        let published = load_settings(&self.path).and_then(|settings| self.store.publish(settings));
        match published {
            Ok(version) => {
                log::info!(
                    "[SettingsWatcher] Reloaded {} as v{}",
                    self.path.display(),
                    version
                );
                true
            }
            Err(e) => {
                log::warn!(
                    "[SettingsWatcher] Keeping previous settings, reload of {} failed: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }
}

fn watch_error(path: &Path, error: notify::Error) -> TerrainError {
    TerrainError::Watch {
        path: path.display().to_string(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{save_settings, TerrainSettings};

    #[test]
    fn test_reload_publishes_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.toml");
        save_settings(&path, &TerrainSettings::default()).unwrap();

        let store = Arc::new(SettingsStore::new(TerrainSettings::default()).unwrap());
        let watcher = SettingsWatcher::new(&path, Arc::clone(&store), 50).unwrap();

        let mut changed = TerrainSettings::default();
        changed.height.seed = 1234;
        save_settings(&path, &changed).unwrap();

        assert!(watcher.reload_now());
        assert_eq!(store.current().unwrap().height.seed, 1234);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_reload_failure_keeps_previous_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = Arc::new(SettingsStore::new(TerrainSettings::default()).unwrap());
        let watcher = SettingsWatcher::new(&path, Arc::clone(&store), 50).unwrap();

        assert!(!watcher.reload_now());
        assert_eq!(store.version(), 1);
        assert!(store.current().is_some());
    }

    #[test]
    fn test_poll_without_changes_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.toml");
        save_settings(&path, &TerrainSettings::default()).unwrap();

        let store = Arc::new(SettingsStore::new(TerrainSettings::default()).unwrap());
        let mut watcher = SettingsWatcher::new(&path, Arc::clone(&store), 10_000).unwrap();
        assert!(!watcher.poll());
        assert_eq!(store.version(), 1);
    }
}
