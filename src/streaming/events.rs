use super::coord::ChunkCoord;
use crate::thread_pool::ComputeError;

/// Background job a chunk was waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Height,
    Mesh { lod_index: usize },
}

/// Notifications published by `ChunkStreamer` after each tick
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    VisibilityChanged {
        coord: ChunkCoord,
        visible: bool,
    },
    /// The chunk now renders the mesh of `lod_index` in the LOD table
    MeshActivated {
        coord: ChunkCoord,
        lod_index: usize,
    },
    ColliderAttached {
        coord: ChunkCoord,
        lod_index: usize,
    },
    ComputeFailed {
        coord: ChunkCoord,
        job: JobKind,
        attempts: u32,
        will_retry: bool,
        error: ComputeError,
    },
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::VisibilityChanged { coord, .. }
            | ChunkEvent::MeshActivated { coord, .. }
            | ChunkEvent::ColliderAttached { coord, .. }
            | ChunkEvent::ComputeFailed { coord, .. } => *coord,
        }
    }
}
