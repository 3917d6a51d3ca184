use crate::constants::{mesh, streaming};
use crate::error::{TerrainError, TerrainResult};
use crate::generation::NoiseLayerConfig;
use crate::heightmap::ResponseCurve;
use crate::streaming::LodInfo;
use crate::thread_pool::SpawnStrategy;
use serde::{Deserialize, Serialize};

/// Noise stack and elevation shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    pub seed: u32,
    pub noise_layers: Vec<NoiseLayerConfig>,
    pub height_multiplier: f32,
    pub use_falloff: bool,
    /// `None` selects the built-in falloff profile
    pub falloff_curve: Option<ResponseCurve>,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            noise_layers: vec![
                NoiseLayerConfig::simple(5, 0.008),
                NoiseLayerConfig {
                    min_value: 0.4,
                    strength: 1.5,
                    ..NoiseLayerConfig::ridged(4, 0.02)
                },
            ],
            height_multiplier: 30.0,
            use_falloff: false,
            falloff_curve: None,
        }
    }
}

/// Chunk resolution and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    pub mesh_scale: f32,
    pub use_flat_shading: bool,
    /// Index into `SUPPORTED_CHUNK_SIZES`
    pub chunk_size_index: usize,
    /// Index into the flat shaded prefix of `SUPPORTED_CHUNK_SIZES`
    pub flat_shaded_chunk_size_index: usize,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_scale: 1.0,
            use_flat_shading: false,
            chunk_size_index: 2,
            flat_shaded_chunk_size_index: 0,
        }
    }
}

impl MeshSettings {
    /// Quads per chunk side at LOD 0
    pub fn chunk_size(&self) -> usize {
        let (index, available) = if self.use_flat_shading {
            (
                self.flat_shaded_chunk_size_index,
                mesh::NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES,
            )
        } else {
            (self.chunk_size_index, mesh::SUPPORTED_CHUNK_SIZES.len())
        };
        mesh::SUPPORTED_CHUNK_SIZES[index.min(available - 1)]
    }

    /// Grid vertices per line including the skirt ring
    pub fn vertices_per_line(&self) -> usize {
        self.chunk_size() + mesh::EXTRA_VERTICES_PER_LINE
    }

    /// World-space side length of one chunk
    pub fn mesh_world_size(&self) -> f32 {
        (self.vertices_per_line() - 3) as f32 * self.mesh_scale
    }
}

/// Which elevation source mesh jobs read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSource {
    /// Build a height grid per chunk first, then mesh from it
    #[default]
    HeightGrid,
    /// Evaluate the noise field per vertex while meshing
    DirectNoise,
}

/// Streaming behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerSettings {
    pub viewer_move_threshold: f32,
    pub collider_generation_distance: f32,
    pub max_compute_retries: u32,
    pub mesh_source: MeshSource,
    pub spawn_strategy: SpawnStrategy,
}

impl Default for StreamerSettings {
    fn default() -> Self {
        Self {
            viewer_move_threshold: streaming::VIEWER_MOVE_THRESHOLD,
            collider_generation_distance: streaming::COLLIDER_GENERATION_DISTANCE,
            max_compute_retries: streaming::MAX_COMPUTE_RETRIES,
            mesh_source: MeshSource::HeightGrid,
            spawn_strategy: SpawnStrategy::Dedicated,
        }
    }
}

/// Root configuration object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub height: HeightMapSettings,
    pub mesh: MeshSettings,
    /// Strictly increasing visible distances, finest LOD first
    pub lods: Vec<LodInfo>,
    pub collider_lod_index: usize,
    pub streaming: StreamerSettings,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            height: HeightMapSettings::default(),
            mesh: MeshSettings::default(),
            lods: vec![
                LodInfo::new(0, 120.0),
                LodInfo::new(2, 240.0),
                LodInfo::new(4, 360.0),
            ],
            collider_lod_index: 0,
            streaming: StreamerSettings::default(),
        }
    }
}

impl TerrainSettings {
    /// Largest visible distance, zero for an empty LOD table
    pub fn max_view_distance(&self) -> f32 {
        self.lods.last().map_or(0.0, |lod| lod.visible_distance)
    }

    /// Clamp recoverable values and reject unrecoverable ones
    pub fn validate(&mut self) -> TerrainResult<()> {
        for (index, layer) in self.height.noise_layers.iter_mut().enumerate() {
            if layer.clamp_to_valid() {
                log::warn!("[TerrainSettings] Clamped noise layer {} into valid range", index);
            }
        }
        if !self.height.height_multiplier.is_finite() {
            log::warn!("[TerrainSettings] Non-finite height multiplier, using 1.0");
            self.height.height_multiplier = 1.0;
        }

        if !(self.mesh.mesh_scale.is_finite() && self.mesh.mesh_scale > 0.0) {
            log::warn!(
                "[TerrainSettings] mesh_scale {} must be positive, using 1.0",
                self.mesh.mesh_scale
            );
            self.mesh.mesh_scale = 1.0;
        }
        let max_size_index = mesh::SUPPORTED_CHUNK_SIZES.len() - 1;
        if self.mesh.chunk_size_index > max_size_index {
            log::warn!(
                "[TerrainSettings] chunk_size_index {} clamped to {}",
                self.mesh.chunk_size_index,
                max_size_index
            );
            self.mesh.chunk_size_index = max_size_index;
        }
        let max_flat_index = mesh::NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES - 1;
        if self.mesh.flat_shaded_chunk_size_index > max_flat_index {
            log::warn!(
                "[TerrainSettings] flat_shaded_chunk_size_index {} clamped to {}",
                self.mesh.flat_shaded_chunk_size_index,
                max_flat_index
            );
            self.mesh.flat_shaded_chunk_size_index = max_flat_index;
        }

        self.validate_lods()?;

        let streaming = &mut self.streaming;
        if !(streaming.viewer_move_threshold.is_finite() && streaming.viewer_move_threshold >= 0.0) {
            streaming.viewer_move_threshold = crate::constants::streaming::VIEWER_MOVE_THRESHOLD;
        }
        if !(streaming.collider_generation_distance.is_finite()
            && streaming.collider_generation_distance >= 0.0)
        {
            streaming.collider_generation_distance =
                crate::constants::streaming::COLLIDER_GENERATION_DISTANCE;
        }

        Ok(())
    }

    fn validate_lods(&self) -> TerrainResult<()> {
        if self.lods.is_empty() {
            return Err(TerrainError::invalid_config("lod table is empty"));
        }

        let mut previous: Option<f32> = None;
        for (index, info) in self.lods.iter().enumerate() {
            if info.lod >= mesh::NUM_SUPPORTED_LODS {
                return Err(TerrainError::invalid_config(format!(
                    "lod {} at index {} is outside 0..={}",
                    info.lod,
                    index,
                    mesh::NUM_SUPPORTED_LODS - 1
                )));
            }
            if !(info.visible_distance.is_finite() && info.visible_distance > 0.0) {
                return Err(TerrainError::invalid_config(format!(
                    "visible distance {} at index {} must be positive",
                    info.visible_distance, index
                )));
            }
            if let Some(previous) = previous {
                if info.visible_distance <= previous {
                    return Err(TerrainError::invalid_config(format!(
                        "visible distances must be strictly increasing ({} after {})",
                        info.visible_distance, previous
                    )));
                }
            }
            previous = Some(info.visible_distance);
        }

        if self.collider_lod_index >= self.lods.len() {
            return Err(TerrainError::invalid_config(format!(
                "collider_lod_index {} out of range for {} lods",
                self.collider_lod_index,
                self.lods.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let mut settings = TerrainSettings::default();
        let before = settings.clone();
        settings.validate().unwrap();
        assert_eq!(settings, before);
    }

    #[test]
    fn test_vertices_per_line_and_world_size() {
        let mut mesh = MeshSettings {
            chunk_size_index: 0,
            mesh_scale: 2.0,
            ..MeshSettings::default()
        };
        assert_eq!(mesh.vertices_per_line(), 53);
        assert_eq!(mesh.mesh_world_size(), 100.0);

        mesh.use_flat_shading = true;
        mesh.flat_shaded_chunk_size_index = 2;
        assert_eq!(mesh.vertices_per_line(), 101);
    }

    #[test]
    fn test_flat_shading_restricts_sizes() {
        let mesh = MeshSettings {
            use_flat_shading: true,
            flat_shaded_chunk_size_index: 8,
            ..MeshSettings::default()
        };
        assert_eq!(mesh.chunk_size(), 96);
    }

    #[test]
    fn test_validate_clamps_recoverable_values() {
        let mut settings = TerrainSettings::default();
        settings.mesh.mesh_scale = -3.0;
        settings.mesh.chunk_size_index = 40;
        settings.height.noise_layers[0].octaves = 0;

        settings.validate().unwrap();
        assert_eq!(settings.mesh.mesh_scale, 1.0);
        assert_eq!(settings.mesh.chunk_size_index, 8);
        assert_eq!(settings.height.noise_layers[0].octaves, 1);
    }

    #[test]
    fn test_validate_rejects_bad_lod_tables() {
        let mut empty = TerrainSettings {
            lods: Vec::new(),
            ..TerrainSettings::default()
        };
        assert!(matches!(empty.validate(), Err(TerrainError::InvalidConfig { .. })));

        let mut unordered = TerrainSettings {
            lods: vec![LodInfo::new(0, 200.0), LodInfo::new(1, 200.0)],
            ..TerrainSettings::default()
        };
        assert!(unordered.validate().is_err());

        let mut too_coarse = TerrainSettings {
            lods: vec![LodInfo::new(5, 100.0)],
            ..TerrainSettings::default()
        };
        assert!(too_coarse.validate().is_err());

        let mut bad_collider = TerrainSettings {
            lods: vec![LodInfo::new(0, 100.0)],
            collider_lod_index: 1,
            ..TerrainSettings::default()
        };
        assert!(bad_collider.validate().is_err());
    }

    #[test]
    fn test_max_view_distance() {
        let settings = TerrainSettings::default();
        assert_eq!(settings.max_view_distance(), 360.0);
    }
}
