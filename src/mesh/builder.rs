use super::arena::{VertexArena, VertexIndexMap, VertexRef};
use super::buffer::MeshBuffer;
use super::error::MeshError;
use super::layout::{MeshLayout, VertexRole};
use super::source::{ElevationSampler, ElevationSource};
use crate::config::MeshSettings;
use crate::heightmap::HeightRange;
use crate::streaming::ChunkCoord;
use glam::{Vec2, Vec3};

/// Build the mesh of one chunk at one LOD
pub fn triangulate(
    lod: usize,
    settings: &MeshSettings,
    coord: ChunkCoord,
    source: ElevationSource<'_>,
) -> Result<MeshBuffer, MeshError> {
    let vertices_per_line = settings.vertices_per_line();
    let layout = MeshLayout::for_lod(vertices_per_line, lod)?;
    let sampler = ElevationSampler::bind(source, coord, vertices_per_line)?;
    MeshBuilder::new(layout, settings.mesh_world_size(), settings.use_flat_shading)
        .build(lod, |x, y| sampler.height(x, y))
}

/// Triangulates a `MeshLayout` over a height function
#[derive(Debug, Clone, Copy)]
pub struct MeshBuilder {
    layout: MeshLayout,
    world_size: f32,
    flat_shading: bool,
}

impl MeshBuilder {
    pub fn new(layout: MeshLayout, world_size: f32, flat_shading: bool) -> Self {
        Self {
            layout,
            world_size,
            flat_shading,
        }
    }

    pub fn layout(&self) -> &MeshLayout {
        &self.layout
    }

    /// `height_at(x, y)` is the final (already scaled) height of grid position `(x, y)`
    pub fn build(
        &self,
        lod: usize,
        height_at: impl Fn(usize, usize) -> f32,
    ) -> Result<MeshBuffer, MeshError> {
        let layout = &self.layout;
        layout.ensure_triangulable()?;

        let n = layout.vertices_per_line();
        let skip = layout.skip();
        let map = VertexIndexMap::from_layout(layout);
        let mut arena = VertexArena::with_layout(layout, &map);
        let mut height_range = HeightRange::EMPTY;

        let top_left = Vec2::new(-1.0, 1.0) * self.world_size / 2.0;
        let span = (n - 3) as f32;

        for y in 0..n {
            for x in 0..n {
                let Some(vertex) = map.get(x, y) else {
                    continue;
                };
                let role = layout.classify(x, y);

                let percent = Vec2::new(x as f32 - 1.0, y as f32 - 1.0) / span;
                let planar = top_left + Vec2::new(percent.x, -percent.y) * self.world_size;
                let height = if role == VertexRole::EdgeConnection {
                    self.connection_height(x, y, &height_at)
                } else {
                    height_at(x, y)
                };

                arena.set_vertex(vertex, Vec3::new(planar.x, height, planar.y), percent);
                if let VertexRef::Interior(_) = vertex {
                    height_range.include(height);
                }

                // Edge connections on the near ring are covered by mesh-edge and main quads
                let closes_quad = x < n - 1
                    && y < n - 1
                    && (role != VertexRole::EdgeConnection || (x != 2 && y != 2));
                if !closes_quad {
                    continue;
                }

                let step = if role == VertexRole::Main && x != n - 3 && y != n - 3 {
                    skip
                } else {
                    1
                };
                let a = vertex;
                let b = map.require(x + step, y)?;
                let c = map.require(x, y + step)?;
                let d = map.require(x + step, y + step)?;
                arena.add_triangle(a, d, c);
                arena.add_triangle(d, a, b);
            }
        }

        let buffer = if self.flat_shading {
            let (positions, uvs, triangles) = arena.into_parts();
            flat_shaded(lod, positions, uvs, triangles, height_range)
        } else {
            let normals = arena.bake_normals();
            let (positions, uvs, triangles) = arena.into_parts();
            MeshBuffer {
                lod,
                flat_shaded: false,
                positions,
                normals,
                uvs,
                triangles,
                height_range,
            }
        };

        log::debug!(
            "[MeshBuilder] LOD {} mesh: {} vertices, {} triangles",
            lod,
            buffer.vertex_count(),
            buffer.triangle_count()
        );
        Ok(buffer)
    }

    /// Linear blend between the two lattice vertices on either side of an
    /// edge-connection position, along its ring
    fn connection_height(&self, x: usize, y: usize, height_at: &impl Fn(usize, usize) -> f32) -> f32 {
        let n = self.layout.vertices_per_line();
        let skip = self.layout.skip();
        let vertical = x == 2 || x == n - 3;

        let along = if vertical { y } else { x };
        let dst_a = (along - 2) % skip;
        let dst_b = skip - dst_a;
        let t = dst_a as f32 / skip as f32;

        let (height_a, height_b) = if vertical {
            (height_at(x, y - dst_a), height_at(x, y + dst_b))
        } else {
            (height_at(x - dst_a, y), height_at(x + dst_b, y))
        };
        height_a * (1.0 - t) + height_b * t
    }
}

/// Give every triangle its own three vertices with the face normal
fn flat_shaded(
    lod: usize,
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<u32>,
    height_range: HeightRange,
) -> MeshBuffer {
    let mut flat_positions = Vec::with_capacity(triangles.len());
    let mut flat_uvs = Vec::with_capacity(triangles.len());
    let mut normals = Vec::with_capacity(triangles.len());

    for tri in triangles.chunks_exact(3) {
        let corners = [tri[0], tri[1], tri[2]].map(|index| positions[index as usize]);
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        for (corner, &index) in corners.iter().zip(tri) {
            flat_positions.push(*corner);
            flat_uvs.push(uvs[index as usize]);
            normals.push(normal);
        }
    }

    MeshBuffer {
        lod,
        flat_shaded: true,
        triangles: (0..flat_positions.len() as u32).collect(),
        positions: flat_positions,
        normals,
        uvs: flat_uvs,
        height_range,
    }
}
