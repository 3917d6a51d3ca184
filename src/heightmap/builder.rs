use super::context::GenerationContext;
use super::curve::ResponseCurve;
use super::range::HeightRange;
use crate::config::HeightMapSettings;
use crate::generation::NoiseField;
use glam::Vec2;

/// Noise sample position of grid cell `(x, y)`.
///
/// Offsets are centred on `sample_centre` and rows run toward -z, matching the
/// mesh's top-left origin. All offsets are whole numbers so two chunks whose
/// centres differ by a whole number of cells produce bit-identical border samples.
pub fn grid_sample_point(sample_centre: Vec2, x: usize, y: usize, width: usize, height: usize) -> Vec2 {
    let dx = x as i64 - (width / 2) as i64;
    let dy = y as i64 - (height / 2) as i64;
    Vec2::new(sample_centre.x + dx as f32, sample_centre.y - dy as f32)
}

/// Raw noise elevation for one chunk, plus the multiplier meshes apply to it
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
    range: HeightRange,
    height_multiplier: f32,
}

impl HeightGrid {
    pub fn from_fn(
        width: usize,
        height: usize,
        height_multiplier: f32,
        mut sample: impl FnMut(usize, usize) -> f32,
    ) -> Self {
        let mut values = Vec::with_capacity(width * height);
        let mut range = HeightRange::EMPTY;
        for y in 0..height {
            for x in 0..width {
                let value = sample(x, y);
                range.include(value);
                values.push(value);
            }
        }

        Self {
            width,
            height,
            values,
            range,
            height_multiplier,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw noise value
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    /// Noise value scaled by the height multiplier
    pub fn elevation(&self, x: usize, y: usize) -> f32 {
        self.get(x, y) * self.height_multiplier
    }

    /// Min/max of the raw values
    pub fn range(&self) -> HeightRange {
        self.range
    }

    pub fn height_multiplier(&self) -> f32 {
        self.height_multiplier
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Builds height grids from one `HeightMapSettings` snapshot
#[derive(Debug, Clone)]
pub struct HeightMapBuilder {
    field: NoiseField,
    height_multiplier: f32,
    use_falloff: bool,
    falloff_curve: Option<ResponseCurve>,
}

impl HeightMapBuilder {
    pub fn new(settings: &HeightMapSettings) -> Self {
        Self {
            field: NoiseField::new(settings.seed, &settings.noise_layers),
            height_multiplier: settings.height_multiplier,
            use_falloff: settings.use_falloff,
            falloff_curve: settings.falloff_curve.clone(),
        }
    }

    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// Evaluate the noise field for every cell. With falloff enabled each value
    /// is scaled by `1 - falloff(cell)`, which shapes a single island rather than
    /// a seamless tiling.
    pub fn build(
        &self,
        width: usize,
        height: usize,
        sample_centre: Vec2,
        context: &GenerationContext,
    ) -> HeightGrid {
        let falloff = self
            .use_falloff
            .then(|| context.falloff_map(width.max(height), self.falloff_curve.as_ref()));

        HeightGrid::from_fn(width, height, self.height_multiplier, |x, y| {
            let point = grid_sample_point(sample_centre, x, y, width, height);
            let value = self.field.evaluate_2d(point);
            match &falloff {
                Some(map) => value * (1.0 - map.get(x, y)),
                None => value,
            }
        })
    }
}

pub fn build_height_grid(
    width: usize,
    height: usize,
    settings: &HeightMapSettings,
    sample_centre: Vec2,
    context: &GenerationContext,
) -> HeightGrid {
    HeightMapBuilder::new(settings).build(width, height, sample_centre, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::NoiseLayerConfig;

    fn settings() -> HeightMapSettings {
        HeightMapSettings {
            seed: 12,
            noise_layers: vec![NoiseLayerConfig::simple(4, 0.05)],
            height_multiplier: 10.0,
            use_falloff: false,
            falloff_curve: None,
        }
    }

    #[test]
    fn test_sample_point_is_centred() {
        let centre = Vec2::new(100.0, -40.0);
        assert_eq!(grid_sample_point(centre, 5, 5, 11, 11), centre);
        assert_eq!(grid_sample_point(centre, 0, 0, 11, 11), Vec2::new(95.0, -35.0));
        assert_eq!(grid_sample_point(centre, 10, 10, 11, 11), Vec2::new(105.0, -45.0));
    }

    #[test]
    fn test_build_matches_field_and_tracks_range() {
        let context = GenerationContext::new();
        let builder = HeightMapBuilder::new(&settings());
        let centre = Vec2::new(32.0, 64.0);
        let grid = builder.build(9, 9, centre, &context);

        assert_eq!(grid.values().len(), 81);
        for y in 0..9 {
            for x in 0..9 {
                let expected = builder
                    .field()
                    .evaluate_2d(grid_sample_point(centre, x, y, 9, 9));
                assert_eq!(grid.get(x, y), expected);
                assert_eq!(grid.elevation(x, y), expected * 10.0);
                assert!(grid.range().min <= expected && expected <= grid.range().max);
            }
        }
    }

    #[test]
    fn test_neighbouring_grids_share_border_samples() {
        let context = GenerationContext::new();
        let n = 13;
        let step = (n - 3) as f32;
        let builder = HeightMapBuilder::new(&settings());
        let left = builder.build(n, n, Vec2::ZERO, &context);
        let right = builder.build(n, n, Vec2::new(step, 0.0), &context);
        let above = builder.build(n, n, Vec2::new(0.0, step), &context);

        for k in 0..n {
            assert_eq!(left.get(n - 2, k), right.get(1, k));
            assert_eq!(left.get(k, 1), above.get(k, n - 2));
        }
    }

    #[test]
    fn test_falloff_flattens_border() {
        let context = GenerationContext::new();
        let mut with_falloff = settings();
        with_falloff.use_falloff = true;
        let grid = build_height_grid(16, 16, &with_falloff, Vec2::ZERO, &context);

        // Corner falloff is 1 so the value is fully suppressed
        assert_eq!(grid.get(0, 0), 0.0);
        assert_eq!(context.falloff_cache().len(), 1);
    }
}
