use super::falloff::{FalloffCache, FalloffMap};
use super::curve::ResponseCurve;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation state owned by one streaming session and shared with its
/// background jobs. Replaces process-wide caches.
#[derive(Default)]
pub struct GenerationContext {
    falloff: FalloffCache,
    settings_version: AtomicU64,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn falloff_map(&self, size: usize, curve: Option<&ResponseCurve>) -> Arc<FalloffMap> {
        self.falloff.get_or_build(size, curve)
    }

    pub fn falloff_cache(&self) -> &FalloffCache {
        &self.falloff
    }

    pub fn settings_version(&self) -> u64 {
        self.settings_version.load(Ordering::Acquire)
    }

    /// Record a settings version bump. Returns false if the version was already current.
    pub fn on_settings_changed(&self, version: u64) -> bool {
        let previous = self.settings_version.swap(version, Ordering::AcqRel);
        if previous == version {
            return false;
        }
        log::info!(
            "[GenerationContext] Settings version {} -> {}, dropping cached falloff maps",
            previous,
            version
        );
        self.falloff.invalidate();
        true
    }
}
