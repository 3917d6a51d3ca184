// Terrain Engine Constants - SINGLE SOURCE OF TRUTH
//
// Tuning constants shared by generation, meshing and streaming.
// Runtime-configurable values take their defaults from here.

/// Mesh resolution tables
pub mod mesh {
    /// LOD values a mesh can be built at (skip increments 1, 2, 4, 6, 8)
    pub const NUM_SUPPORTED_LODS: usize = 5;

    /// Chunk sizes in quads at LOD 0. Every size is divisible by every skip increment.
    pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];

    /// Flat shading explodes every triangle, so only the smallest sizes are allowed
    pub const NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES: usize = 3;

    /// Vertices per line beyond the chunk size: skirt ring, mesh-edge ring and the closing vertex
    pub const EXTRA_VERTICES_PER_LINE: usize = 5;

    /// Smallest grid the stitching layout can describe
    pub const MIN_VERTICES_PER_LINE: usize = 6;
}

/// Streaming defaults
pub mod streaming {
    /// Viewer travel (world units) that triggers a full visible-set refresh
    pub const VIEWER_MOVE_THRESHOLD: f32 = 25.0;

    /// Distance to the chunk bounds under which the collider mesh is attached
    pub const COLLIDER_GENERATION_DISTANCE: f32 = 5.0;

    /// Retries granted to a failed height or mesh job before the chunk gives up
    pub const MAX_COMPUTE_RETRIES: u32 = 3;
}

/// Falloff profile
pub mod falloff {
    /// Exponent of the built-in falloff profile
    pub const DEFAULT_EXPONENT: f32 = 3.0;

    /// Shift of the built-in falloff profile
    pub const DEFAULT_SHIFT: f32 = 2.2;
}

/// Compute queue
pub mod compute {
    /// Poll interval used by the blocking drain helpers
    pub const IDLE_POLL_INTERVAL_MS: u64 = 1;

    /// Thread name prefix for background jobs
    pub const THREAD_NAME_PREFIX: &str = "terrain";
}
