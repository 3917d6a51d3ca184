use super::settings::TerrainSettings;
use crate::error::TerrainResult;
use crate::event_system::{EventHandler, SubscriptionId, Subscribers};
use parking_lot::RwLock;
use std::sync::Arc;

/// Published after every settings change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsChanged {
    pub version: u64,
    /// False after `clear()`
    pub present: bool,
}

struct Snapshot {
    settings: Option<Arc<TerrainSettings>>,
    version: u64,
}

/// Owner of the live terrain settings.
///
/// Readers take an `Arc` snapshot; a publish swaps in a new snapshot, bumps
/// the version and notifies subscribers after the lock is released.
pub struct SettingsStore {
    current: RwLock<Snapshot>,
    subscribers: Subscribers<SettingsChanged>,
}

impl SettingsStore {
    pub fn new(settings: TerrainSettings) -> TerrainResult<Self> {
        let store = Self::empty();
        store.publish(settings)?;
        Ok(store)
    }

    /// A store with no settings; streaming ticks are no-ops until something is published
    pub fn empty() -> Self {
        Self {
            current: RwLock::new(Snapshot {
                settings: None,
                version: 0,
            }),
            subscribers: Subscribers::new(),
        }
    }

    pub fn current(&self) -> Option<Arc<TerrainSettings>> {
        self.current.read().settings.clone()
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Settings and the version they were published under, read atomically
    pub fn snapshot(&self) -> (Option<Arc<TerrainSettings>>, u64) {
        let current = self.current.read();
        (current.settings.clone(), current.version)
    }

    /// Validate and publish new settings. Returns the new version.
    pub fn publish(&self, mut settings: TerrainSettings) -> TerrainResult<u64> {
        settings.validate()?;
        let version = self.swap(Some(Arc::new(settings)));
        log::info!("[SettingsStore] Published terrain settings v{}", version);
        Ok(version)
    }

    /// Remove the settings. Returns the new version.
    pub fn clear(&self) -> u64 {
        let version = self.swap(None);
        log::info!("[SettingsStore] Cleared terrain settings (v{})", version);
        version
    }

    fn swap(&self, settings: Option<Arc<TerrainSettings>>) -> u64 {
        let event = {
            let mut current = self.current.write();
            current.version += 1;
            current.settings = settings;
            SettingsChanged {
                version: current.version,
                present: current.settings.is_some(),
            }
        };
        self.subscribers.publish(&event);
        event.version
    }

    pub fn subscribe<H>(&self, handler: H) -> SubscriptionId
    where
        H: EventHandler<SettingsChanged> + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerrainError;
    use parking_lot::Mutex;

    #[test]
    fn test_publish_bumps_version_and_notifies() {
        let store = SettingsStore::empty();
        assert!(store.current().is_none());
        assert_eq!(store.version(), 0);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |event: &SettingsChanged| sink.lock().push(*event));

        let version = store.publish(TerrainSettings::default()).unwrap();
        assert_eq!(version, 1);
        assert!(store.current().is_some());

        assert_eq!(store.clear(), 2);
        assert!(store.current().is_none());

        assert_eq!(
            *seen.lock(),
            vec![
                SettingsChanged { version: 1, present: true },
                SettingsChanged { version: 2, present: false },
            ]
        );
    }

    #[test]
    fn test_invalid_settings_leave_store_untouched() {
        let store = SettingsStore::new(TerrainSettings::default()).unwrap();
        let before = store.current().unwrap();

        let result = store.publish(TerrainSettings {
            lods: Vec::new(),
            ..TerrainSettings::default()
        });
        assert!(matches!(result, Err(TerrainError::InvalidConfig { .. })));
        assert_eq!(store.version(), 1);
        assert!(Arc::ptr_eq(&before, &store.current().unwrap()));
    }

    #[test]
    fn test_unsubscribe() {
        let store = SettingsStore::empty();
        let id = store.subscribe(|_: &SettingsChanged| {});
        assert_eq!(store.subscriber_count(), 1);
        assert!(store.unsubscribe(id));
        assert_eq!(store.subscriber_count(), 0);
    }
}
