//! Edge falloff
//!
//! Square radial profile that pushes terrain down toward the grid border.
//! Maps are memoized per size in a `FalloffCache` owned by the streaming
//! session's `GenerationContext`.

use super::curve::ResponseCurve;
use crate::constants::falloff::{DEFAULT_EXPONENT, DEFAULT_SHIFT};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Built-in profile used when no response curve is configured
pub fn default_falloff(v: f32) -> f32 {
    let a = v.powf(DEFAULT_EXPONENT);
    let b = (DEFAULT_SHIFT - DEFAULT_SHIFT * v).powf(DEFAULT_EXPONENT);
    if a + b == 0.0 {
        return 0.0;
    }
    a / (a + b)
}

/// Square falloff map, values in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct FalloffMap {
    size: usize,
    values: Vec<f32>,
}

impl FalloffMap {
    pub fn generate(size: usize, curve: Option<&ResponseCurve>) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for j in 0..size {
            for i in 0..size {
                let x = i as f32 / size as f32 * 2.0 - 1.0;
                let y = j as f32 / size as f32 * 2.0 - 1.0;
                let v = x.abs().max(y.abs());
                let value = match curve {
                    Some(curve) => curve.evaluate(v),
                    None => default_falloff(v),
                };
                values.push(value);
            }
        }
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[j * self.size + i]
    }
}

struct FalloffEntry {
    curve: Option<ResponseCurve>,
    map: Arc<FalloffMap>,
}

/// Size-keyed falloff memo. An entry is only reused when its curve matches
/// the requested one, so a curve change can never serve a stale map.
#[derive(Default)]
pub struct FalloffCache {
    entries: RwLock<FxHashMap<usize, Vec<FalloffEntry>>>,
}

impl FalloffCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, size: usize, curve: Option<&ResponseCurve>) -> Arc<FalloffMap> {
        if let Some(map) = Self::lookup(&self.entries.read(), size, curve) {
            return map;
        }

        let mut entries = self.entries.write();
        // Another thread may have built it while we waited for the write lock
        if let Some(map) = Self::lookup(&entries, size, curve) {
            return map;
        }

        log::debug!("[FalloffCache] Building {}x{} falloff map", size, size);
        let map = Arc::new(FalloffMap::generate(size, curve));
        entries.entry(size).or_default().push(FalloffEntry {
            curve: curve.cloned(),
            map: Arc::clone(&map),
        });
        map
    }

    fn lookup(
        entries: &FxHashMap<usize, Vec<FalloffEntry>>,
        size: usize,
        curve: Option<&ResponseCurve>,
    ) -> Option<Arc<FalloffMap>> {
        entries
            .get(&size)?
            .iter()
            .find(|entry| entry.curve.as_ref() == curve)
            .map(|entry| Arc::clone(&entry.map))
    }

    /// Drop every memoized map
    pub fn invalidate(&self) {
        let mut entries = self.entries.write();
        if !entries.is_empty() {
            log::info!("[FalloffCache] Invalidated {} cached sizes", entries.len());
        }
        entries.clear();
    }

    /// Number of cached maps across all sizes
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::CurveKey;

    #[test]
    fn test_default_profile_endpoints() {
        assert_eq!(default_falloff(0.0), 0.0);
        assert!((default_falloff(1.0) - 1.0).abs() < 1e-6);
        assert!(default_falloff(0.3) < default_falloff(0.7));
    }

    #[test]
    fn test_default_map_is_symmetric() {
        let size = 20;
        let map = FalloffMap::generate(size, None);

        assert!(map.get(size / 2, size / 2).abs() < 1e-6, "centre should be ~0");
        assert!((map.get(0, 0) - 1.0).abs() < 1e-6, "corner should be ~1");

        for j in 0..size {
            for i in 0..size {
                assert_eq!(map.get(i, j), map.get(j, i));
                if i > 0 {
                    let mirrored = map.get(size - i, j);
                    assert!(
                        (map.get(i, j) - mirrored).abs() < 1e-5,
                        "mirror at ({}, {})",
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_curve_overrides_default_profile() {
        let flat = ResponseCurve::new([CurveKey::new(0.0, 0.25), CurveKey::new(1.0, 0.25)]);
        let map = FalloffMap::generate(8, Some(&flat));
        assert!((0..8).all(|i| map.get(i, 3) == 0.25));
    }

    #[test]
    fn test_cache_reuses_and_separates_by_curve() {
        let cache = FalloffCache::new();
        let a = cache.get_or_build(16, None);
        let b = cache.get_or_build(16, None);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let curve = ResponseCurve::linear();
        let c = cache.get_or_build(16, Some(&curve));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.get(0, 0), 1.0);
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        let d = cache.get_or_build(16, None);
        assert!(!Arc::ptr_eq(&a, &d));
        assert_eq!(*a, *d);
    }
}
