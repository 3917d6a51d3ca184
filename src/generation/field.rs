use super::filter::NoiseFilter;
use super::noise_layer::NoiseLayerConfig;
use glam::{Vec2, Vec3};
use noise::OpenSimplex;

/// Ordered stack of noise layers sharing one seeded simplex source.
///
/// Layer 0 is always evaluated because later layers may use it as a mask,
/// but it only contributes to the elevation when enabled.
#[derive(Clone)]
pub struct NoiseField {
    seed: u32,
    source: OpenSimplex,
    layers: Vec<FieldLayer>,
}

#[derive(Debug, Clone)]
struct FieldLayer {
    filter: NoiseFilter,
    enabled: bool,
    use_first_layer_as_mask: bool,
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("seed", &self.seed)
            .field("layers", &self.layers)
            .finish()
    }
}

impl NoiseField {
    pub fn new(seed: u32, layers: &[NoiseLayerConfig]) -> Self {
        let layers = layers
            .iter()
            .map(|config| FieldLayer {
                filter: NoiseFilter::new(config),
                enabled: config.enabled,
                use_first_layer_as_mask: config.use_first_layer_as_mask,
            })
            .collect();

        Self {
            seed,
            source: OpenSimplex::new(seed),
            layers,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Elevation at a 3D point. Zero for an empty layer stack.
    pub fn evaluate(&self, point: Vec3) -> f32 {
        let Some((first, rest)) = self.layers.split_first() else {
            return 0.0;
        };

        let first_layer_value = first.filter.evaluate(&self.source, point);
        let mut elevation = if first.enabled {
            first_layer_value
        } else {
            0.0
        };

        for layer in rest.iter().filter(|layer| layer.enabled) {
            let mask = if layer.use_first_layer_as_mask {
                first_layer_value
            } else {
                1.0
            };
            elevation += layer.filter.evaluate(&self.source, point) * mask;
        }

        elevation
    }

    /// Samples the plane y = 0, with the 2D point mapped onto (x, z)
    pub fn evaluate_2d(&self, point: Vec2) -> f32 {
        self.evaluate(Vec3::new(point.x, 0.0, point.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::FilterKind;

    fn probe() -> impl Iterator<Item = Vec2> {
        (0..32).map(|i| Vec2::new(i as f32 * 13.7 - 100.0, i as f32 * 5.9 + 40.0))
    }

    #[test]
    fn test_empty_field_is_flat() {
        let field = NoiseField::new(1, &[]);
        assert_eq!(field.evaluate(Vec3::new(12.0, 3.0, -4.0)), 0.0);
    }

    #[test]
    fn test_same_seed_same_field() {
        let layers = [NoiseLayerConfig::simple(4, 0.02), NoiseLayerConfig::ridged(3, 0.05)];
        let a = NoiseField::new(77, &layers);
        let b = NoiseField::new(77, &layers);

        for point in probe() {
            assert_eq!(a.evaluate_2d(point), b.evaluate_2d(point));
        }
    }

    #[test]
    fn test_field_matches_recorded_values() {
        // Recorded from noise 0.8 OpenSimplex; a change here alters every saved world.
        let base = NoiseLayerConfig::simple(4, 0.02);
        let point = Vec2::new(12.5, -3.0);

        let single = NoiseField::new(77, &[base.clone()]).evaluate_2d(point);
        assert!((single - 0.757_657_6).abs() < 1e-5, "base layer drifted: {}", single);

        let field = NoiseField::new(77, &[base, NoiseLayerConfig::ridged(3, 0.05)]);
        let value = field.evaluate_2d(point);
        assert!((value - 1.289_020_5).abs() < 1e-5, "field drifted: {}", value);
    }

    #[test]
    fn test_disabled_first_layer_still_masks() {
        let base = NoiseLayerConfig {
            enabled: false,
            min_value: 100.0,
            ..NoiseLayerConfig::simple(2, 0.02)
        };
        let detail = NoiseLayerConfig::ridged(2, 0.05);

        // First layer is floored to zero everywhere, so the masked detail vanishes too.
        let field = NoiseField::new(9, &[base.clone(), detail.clone()]);
        for point in probe() {
            assert_eq!(field.evaluate_2d(point), 0.0);
        }

        // Without the mask the detail layer shows through.
        let unmasked = NoiseField::new(
            9,
            &[
                base,
                NoiseLayerConfig {
                    use_first_layer_as_mask: false,
                    ..detail
                },
            ],
        );
        assert!(probe().any(|point| unmasked.evaluate_2d(point) != 0.0));
    }

    #[test]
    fn test_disabled_layers_are_skipped() {
        let base = NoiseLayerConfig::simple(3, 0.02);
        let off = NoiseLayerConfig {
            enabled: false,
            filter: FilterKind::Ridged,
            use_first_layer_as_mask: false,
            ..NoiseLayerConfig::default()
        };

        let single = NoiseField::new(4, &[base.clone()]);
        let with_disabled = NoiseField::new(4, &[base, off]);
        for point in probe() {
            assert_eq!(single.evaluate_2d(point), with_disabled.evaluate_2d(point));
        }
    }
}
