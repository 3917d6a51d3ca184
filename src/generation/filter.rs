use super::noise_layer::{FilterKind, NoiseLayerConfig};
use glam::Vec3;
use noise::{NoiseFn, OpenSimplex};

/// Evaluates one noise layer against a shared simplex source
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    config: NoiseLayerConfig,
}

impl NoiseFilter {
    pub fn new(config: &NoiseLayerConfig) -> Self {
        let mut config = config.clone();
        config.clamp_to_valid();
        Self { config }
    }

    pub fn config(&self) -> &NoiseLayerConfig {
        &self.config
    }

    pub fn evaluate(&self, source: &OpenSimplex, point: Vec3) -> f32 {
        match self.config.filter {
            FilterKind::Simple => self.evaluate_simple(source, point),
            FilterKind::Ridged => self.evaluate_ridged(source, point),
        }
    }

    fn evaluate_simple(&self, source: &OpenSimplex, point: Vec3) -> f32 {
        let config = &self.config;
        let mut noise_value = 0.0;
        let mut frequency = config.base_roughness;
        let mut amplitude = 1.0;

        for _ in 0..config.octaves {
            let v = sample(source, point * frequency + config.centre);
            noise_value += (v + 1.0) * 0.5 * amplitude;
            frequency *= config.roughness;
            amplitude *= config.persistence;
        }

        (noise_value - config.min_value).max(0.0) * config.strength
    }

    fn evaluate_ridged(&self, source: &OpenSimplex, point: Vec3) -> f32 {
        let config = &self.config;
        let mut noise_value = 0.0;
        let mut frequency = config.base_roughness;
        let mut amplitude = 1.0;
        let mut weight = 1.0;

        for _ in 0..config.octaves {
            let mut v = 1.0 - sample(source, point * frequency + config.centre).abs();
            v *= v;
            v *= weight;
            weight = (v * config.weight_multiplier).clamp(0.0, 1.0);

            noise_value += v * amplitude;
            frequency *= config.roughness;
            amplitude *= config.persistence;
        }

        (noise_value - config.min_value) * config.strength
    }
}

fn sample(source: &OpenSimplex, point: Vec3) -> f32 {
    source.get([point.x as f64, point.y as f64, point.z as f64]) as f32
}
