use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One entry of the LOD table: the mesh LOD used up to a viewer distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    pub lod: usize,
    pub visible_distance: f32,
}

impl LodInfo {
    pub fn new(lod: usize, visible_distance: f32) -> Self {
        Self {
            lod,
            visible_distance,
        }
    }

    pub fn sqr_visible_distance(&self) -> f32 {
        self.visible_distance * self.visible_distance
    }
}

/// Index of the first table entry whose distance covers `distance`.
/// A distance equal to a threshold picks the finer entry. `None` past the
/// last threshold, meaning the chunk is not visible.
pub fn select_lod_index(levels: &[LodInfo], distance: f32) -> Option<usize> {
    levels
        .iter()
        .position(|level| distance <= level.visible_distance)
}

/// Axis-aligned square footprint of a chunk on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBounds {
    pub centre: Vec2,
    pub size: f32,
}

impl ChunkBounds {
    pub fn new(centre: Vec2, size: f32) -> Self {
        Self { centre, size }
    }

    /// Squared distance from `point` to the nearest point of the square,
    /// zero inside it
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let outside = ((point - self.centre).abs() - Vec2::splat(self.size / 2.0)).max(Vec2::ZERO);
        outside.length_squared()
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.sqr_distance(point) == 0.0
    }
}
