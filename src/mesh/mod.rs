//! Chunk meshing with LOD stitching
//!
//! Every chunk mesh keeps a full-resolution border ring so neighbours at any
//! LOD meet without cracks. Coarser interiors are bridged to that ring by an
//! interpolated "edge connection" ring, and an outer skirt ring exists only to
//! give border vertices correct normals.

pub mod arena;
pub mod buffer;
pub mod builder;
pub mod error;
pub mod layout;
pub mod source;

pub use arena::{VertexArena, VertexIndexMap, VertexRef};
pub use buffer::{MeshBuffer, TerrainVertex};
pub use builder::{triangulate, MeshBuilder};
pub use error::MeshError;
pub use layout::{MeshLayout, VertexRole};
pub use source::ElevationSource;
