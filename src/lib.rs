//! Procedural terrain with distance-based LOD meshes streamed around a viewer.
//!
//! Noise layers produce height grids, height grids become seam-free chunk
//! meshes at several levels of detail, and `ChunkStreamer` keeps the chunks
//! around a moving viewer generated, meshed and collidable. Heavy work runs
//! on background threads; results are applied on the ticking thread.

pub mod config;
pub mod constants;
pub mod error;
pub mod event_system;
pub mod generation;
pub mod heightmap;
pub mod mesh;
pub mod streaming;
pub mod thread_pool;

pub use config::{
    load_settings, save_settings, ConfigFormat, HeightMapSettings, MeshSettings, MeshSource,
    SettingsStore, StreamerSettings, TerrainSettings,
};
#[cfg(feature = "native")]
pub use config::SettingsWatcher;
pub use error::{TerrainError, TerrainResult};
pub use generation::{FilterKind, NoiseField, NoiseLayerConfig};
pub use heightmap::{build_height_grid, GenerationContext, HeightGrid, HeightMapBuilder};
pub use mesh::{triangulate, ElevationSource, MeshBuffer, MeshError, TerrainVertex};
pub use streaming::{ChunkCoord, ChunkEvent, ChunkStreamer, LodInfo, TerrainChunk};
pub use thread_pool::{ComputeError, ComputeQueue, SpawnStrategy};
