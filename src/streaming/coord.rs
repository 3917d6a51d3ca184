use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer position of a chunk in the chunk grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk whose centre is nearest to a world position
    pub fn from_world(position: Vec2, chunk_world_size: f32) -> Self {
        Self::new(
            (position.x / chunk_world_size).round() as i32,
            (position.y / chunk_world_size).round() as i32,
        )
    }

    pub fn world_centre(self, chunk_world_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * chunk_world_size
    }

    /// Saturates at the edge of the `i32` grid
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Centre of this chunk in noise sample space. Neighbouring chunks are
    /// `vertices_per_line - 3` samples apart so their outer rings overlap.
    /// Computed in integers so shared border samples are bit-identical.
    pub fn sample_centre(self, vertices_per_line: usize) -> Vec2 {
        let step = vertices_per_line as i64 - 3;
        Vec2::new(
            (self.x as i64 * step) as f32,
            (self.y as i64 * step) as f32,
        )
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_rounds_to_nearest_chunk() {
        assert_eq!(ChunkCoord::from_world(Vec2::new(0.0, 0.0), 100.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(Vec2::new(49.0, -51.0), 100.0), ChunkCoord::new(0, -1));
        assert_eq!(ChunkCoord::from_world(Vec2::new(260.0, 140.0), 100.0), ChunkCoord::new(3, 1));
    }

    #[test]
    fn test_world_and_sample_centres() {
        let coord = ChunkCoord::new(2, -3);
        assert_eq!(coord.world_centre(48.0), Vec2::new(96.0, -144.0));
        // 53 vertices per line puts neighbours 50 samples apart
        assert_eq!(coord.sample_centre(53), Vec2::new(100.0, -150.0));
        assert_eq!(coord.offset(-2, 3), ChunkCoord::new(0, 0));
    }

    #[test]
    fn test_offset_saturates_at_grid_edge() {
        let far = ChunkCoord::from_world(Vec2::new(2.0e11, -2.0e11), 48.0);
        assert_eq!(far, ChunkCoord::new(i32::MAX, i32::MIN));
        assert_eq!(far.offset(2, -2), far);
        assert_eq!(far.offset(-1, 1), ChunkCoord::new(i32::MAX - 1, i32::MIN + 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(ChunkCoord::new(-1, 4).to_string(), "(-1, 4)");
    }
}
