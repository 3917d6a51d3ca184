use crate::heightmap::HeightRange;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex layout for upload to a GPU vertex buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    pub fn as_bytes(vertices: &[TerrainVertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

/// Finished chunk mesh. Skirt geometry has already been stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffer {
    pub(crate) lod: usize,
    pub(crate) flat_shaded: bool,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) normals: Vec<Vec3>,
    pub(crate) uvs: Vec<Vec2>,
    pub(crate) triangles: Vec<u32>,
    pub(crate) height_range: HeightRange,
}

impl MeshBuffer {
    pub fn lod(&self) -> usize {
        self.lod
    }

    pub fn is_flat_shaded(&self) -> bool {
        self.flat_shaded
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Three indices per triangle
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Min/max of the rendered vertex heights
    pub fn height_range(&self) -> HeightRange {
        self.height_range
    }

    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((position, normal), uv)| TerrainVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }

    /// Index buffer as raw bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}
