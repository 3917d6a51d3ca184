//! Chunk streaming around a moving viewer
//!
//! `ChunkStreamer` owns the chunks and drives them each tick. Chunks request
//! height data and LOD meshes through the background `ComputeQueue` and swap
//! meshes in when results are delivered.

pub mod chunk;
pub mod coord;
pub mod error;
pub mod events;
pub mod lod;
pub mod streamer;

pub use chunk::{ChunkEnv, ChunkState, ColliderState, LodMesh, TerrainChunk};
pub use coord::ChunkCoord;
pub use error::{StreamingErrorContext, StreamingResult};
pub use events::{ChunkEvent, JobKind};
pub use lod::{select_lod_index, ChunkBounds, LodInfo};
pub use streamer::{ChunkStreamer, StreamState, StreamerStats, TickSummary};
