use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Shape of a single noise layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Octave sum of remapped simplex noise, floored at zero
    #[default]
    Simple,
    /// Sharp crests from inverted absolute noise, weighted by the previous octave
    Ridged,
}

/// Parameters of one noise layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerConfig {
    pub enabled: bool,
    /// Multiply this layer by the first layer's value (ignored for layer 0)
    pub use_first_layer_as_mask: bool,
    pub filter: FilterKind,
    pub octaves: u32,
    pub strength: f32,
    /// Frequency of the first octave
    pub base_roughness: f32,
    /// Frequency multiplier applied after each octave
    pub roughness: f32,
    /// Amplitude multiplier applied after each octave
    pub persistence: f32,
    pub centre: Vec3,
    /// Floor subtracted from the octave sum
    pub min_value: f32,
    /// Ridged only: how strongly one octave gates the next
    pub weight_multiplier: f32,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_first_layer_as_mask: true,
            filter: FilterKind::Simple,
            octaves: 4,
            strength: 1.0,
            base_roughness: 0.01,
            roughness: 2.0,
            persistence: 0.5,
            centre: Vec3::ZERO,
            min_value: 0.0,
            weight_multiplier: 0.8,
        }
    }
}

impl NoiseLayerConfig {
    pub fn simple(octaves: u32, base_roughness: f32) -> Self {
        Self {
            octaves,
            base_roughness,
            ..Self::default()
        }
    }

    pub fn ridged(octaves: u32, base_roughness: f32) -> Self {
        Self {
            filter: FilterKind::Ridged,
            octaves,
            base_roughness,
            ..Self::default()
        }
    }

    /// Clamp every field into its valid range. Returns true if anything changed.
    pub fn clamp_to_valid(&mut self) -> bool {
        let before = self.clone();

        self.octaves = self.octaves.max(1);
        self.persistence = sanitize(self.persistence, 0.5).clamp(0.0, 1.0);
        self.roughness = sanitize(self.roughness, 2.0).max(1.0);
        self.base_roughness = sanitize(self.base_roughness, 0.01).max(0.0);
        self.strength = sanitize(self.strength, 1.0);
        self.min_value = sanitize(self.min_value, 0.0);
        self.weight_multiplier = sanitize(self.weight_multiplier, 0.8);
        if !self.centre.is_finite() {
            self.centre = Vec3::ZERO;
        }

        *self != before
    }
}

fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_valid_fixes_out_of_range_values() {
        let mut config = NoiseLayerConfig {
            octaves: 0,
            persistence: 1.5,
            roughness: 0.25,
            base_roughness: -1.0,
            ..NoiseLayerConfig::default()
        };

        assert!(config.clamp_to_valid());
        assert_eq!(config.octaves, 1);
        assert_eq!(config.persistence, 1.0);
        assert_eq!(config.roughness, 1.0);
        assert_eq!(config.base_roughness, 0.0);
    }

    #[test]
    fn test_clamp_to_valid_leaves_good_config_alone() {
        let mut config = NoiseLayerConfig::ridged(6, 0.02);
        assert!(!config.clamp_to_valid());
        assert_eq!(config, NoiseLayerConfig::ridged(6, 0.02));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NoiseLayerConfig = toml::from_str("filter = \"ridged\"\noctaves = 3").unwrap();
        assert_eq!(config.filter, FilterKind::Ridged);
        assert_eq!(config.octaves, 3);
        assert_eq!(config.persistence, 0.5);
        assert!(config.enabled);
    }
}
