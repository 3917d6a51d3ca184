use super::error::MeshError;
use crate::constants::mesh::{EXTRA_VERTICES_PER_LINE, MIN_VERTICES_PER_LINE};

/// Role of one grid position in a chunk mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexRole {
    /// Outermost ring. Shapes border normals, never rendered.
    Skirt,
    /// Interior position between LOD sample points. Produces no vertex.
    Skipped,
    /// Ring one step inside the skirt, always at full resolution
    MeshEdge,
    /// Ring two steps inside the skirt that is not on the LOD lattice.
    /// Height is interpolated between the neighbouring lattice vertices.
    EdgeConnection,
    /// Vertex on the LOD sampling lattice
    Main,
}

/// Grid classification for one `(vertices_per_line, skip)` pair.
///
/// Positions run over `[0, n)` on both axes. The LOD lattice is every
/// `skip`-th position starting at 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshLayout {
    vertices_per_line: usize,
    skip: usize,
}

impl MeshLayout {
    pub fn new(vertices_per_line: usize, skip: usize) -> Result<Self, MeshError> {
        if vertices_per_line < MIN_VERTICES_PER_LINE {
            return Err(MeshError::GridTooSmall { vertices_per_line });
        }
        if skip == 0 {
            return Err(MeshError::UnsupportedSkip {
                vertices_per_line,
                skip,
            });
        }
        Ok(Self {
            vertices_per_line,
            skip,
        })
    }

    pub fn for_lod(vertices_per_line: usize, lod: usize) -> Result<Self, MeshError> {
        Self::new(vertices_per_line, Self::skip_increment(lod))
    }

    /// Grid steps advanced per emitted vertex at a LOD
    pub fn skip_increment(lod: usize) -> usize {
        if lod == 0 {
            1
        } else {
            lod * 2
        }
    }

    pub fn vertices_per_line(&self) -> usize {
        self.vertices_per_line
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Triangulation needs the lattice to land exactly on the far edge-connection ring
    pub fn is_triangulable(&self) -> bool {
        (self.vertices_per_line - EXTRA_VERTICES_PER_LINE) % self.skip == 0
    }

    pub fn ensure_triangulable(&self) -> Result<(), MeshError> {
        if self.is_triangulable() {
            Ok(())
        } else {
            Err(MeshError::UnsupportedSkip {
                vertices_per_line: self.vertices_per_line,
                skip: self.skip,
            })
        }
    }

    pub fn classify(&self, x: usize, y: usize) -> VertexRole {
        let n = self.vertices_per_line;
        let skip = self.skip;

        if x == 0 || y == 0 || x == n - 1 || y == n - 1 {
            return VertexRole::Skirt;
        }
        if x == 1 || y == 1 || x == n - 2 || y == n - 2 {
            return VertexRole::MeshEdge;
        }
        // Every remaining position has x, y in [2, n - 3]
        if (x - 2) % skip == 0 && (y - 2) % skip == 0 {
            return VertexRole::Main;
        }
        if x == 2 || y == 2 || x == n - 3 || y == n - 3 {
            return VertexRole::EdgeConnection;
        }
        VertexRole::Skipped
    }

    /// Mesh-edge ring size
    pub fn edge_vertex_count(&self) -> usize {
        4 * (self.vertices_per_line - 2) - 4
    }

    /// Lattice positions per line inside `[2, n - 3]`
    pub fn main_vertices_per_line(&self) -> usize {
        (self.vertices_per_line - EXTRA_VERTICES_PER_LINE) / self.skip + 1
    }

    pub fn main_vertex_count(&self) -> usize {
        let m = self.main_vertices_per_line();
        m * m
    }

    /// Lattice positions per line strictly inside `(2, n - 3)`
    fn inner_lattice_per_line(&self) -> usize {
        (self.vertices_per_line - EXTRA_VERTICES_PER_LINE - 1) / self.skip
    }

    /// Edge-connection ring size: the ring two steps in, minus its lattice positions
    pub fn edge_connection_vertex_count(&self) -> usize {
        let ring = 4 * (self.vertices_per_line - EXTRA_VERTICES_PER_LINE);
        let inner = self.inner_lattice_per_line();
        ring - (self.main_vertex_count() - inner * inner)
    }

    /// Rendered vertices: mesh edge, edge connection and main
    pub fn mesh_vertex_count(&self) -> usize {
        self.edge_vertex_count() + self.edge_connection_vertex_count() + self.main_vertex_count()
    }

    pub fn skirt_vertex_count(&self) -> usize {
        4 * self.vertices_per_line - 4
    }

    /// Rendered triangles of a triangulable layout
    pub fn mesh_triangle_count(&self) -> usize {
        let m = self.main_vertices_per_line();
        8 * (self.vertices_per_line - 4) + 2 * (m - 1) * (m - 1)
    }

    /// Triangles touching at least one skirt vertex
    pub fn skirt_triangle_count(&self) -> usize {
        8 * (self.vertices_per_line - 2)
    }
}
