use super::error::MeshError;
use super::layout::{MeshLayout, VertexRole};
use glam::{Vec2, Vec3};

/// Index into one of the two vertex lanes of a `VertexArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexRef {
    /// Rendered vertex
    Interior(u32),
    /// Skirt vertex, used for normals only
    Skirt(u32),
}

/// Grid position to vertex lookup for one layout, assigned in row-major order
#[derive(Debug, Clone)]
pub struct VertexIndexMap {
    size: usize,
    refs: Vec<Option<VertexRef>>,
    interior_count: usize,
    skirt_count: usize,
}

impl VertexIndexMap {
    pub fn from_layout(layout: &MeshLayout) -> Self {
        let size = layout.vertices_per_line();
        let mut refs = Vec::with_capacity(size * size);
        let mut interior = 0u32;
        let mut skirt = 0u32;

        for y in 0..size {
            for x in 0..size {
                let vertex = match layout.classify(x, y) {
                    VertexRole::Skipped => None,
                    VertexRole::Skirt => {
                        skirt += 1;
                        Some(VertexRef::Skirt(skirt - 1))
                    }
                    _ => {
                        interior += 1;
                        Some(VertexRef::Interior(interior - 1))
                    }
                };
                refs.push(vertex);
            }
        }

        Self {
            size,
            refs,
            interior_count: interior as usize,
            skirt_count: skirt as usize,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<VertexRef> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.refs[y * self.size + x]
    }

    /// Like `get`, for positions a quad requires to exist
    pub fn require(&self, x: usize, y: usize) -> Result<VertexRef, MeshError> {
        self.get(x, y).ok_or(MeshError::MissingVertex { x, y })
    }

    pub fn interior_count(&self) -> usize {
        self.interior_count
    }

    pub fn skirt_count(&self) -> usize {
        self.skirt_count
    }
}

/// Vertex storage for one mesh build. Triangles made only of interior
/// vertices are rendered; any triangle touching the skirt is kept aside for
/// normal accumulation.
#[derive(Debug, Clone)]
pub struct VertexArena {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    skirt_positions: Vec<Vec3>,
    triangles: Vec<u32>,
    skirt_triangles: Vec<[VertexRef; 3]>,
}

impl VertexArena {
    pub fn new(interior_count: usize, skirt_count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; interior_count],
            uvs: vec![Vec2::ZERO; interior_count],
            skirt_positions: vec![Vec3::ZERO; skirt_count],
            triangles: Vec::new(),
            skirt_triangles: Vec::new(),
        }
    }

    pub fn with_layout(layout: &MeshLayout, map: &VertexIndexMap) -> Self {
        let mut arena = Self::new(map.interior_count(), map.skirt_count());
        if layout.is_triangulable() {
            arena.triangles.reserve(layout.mesh_triangle_count() * 3);
            arena.skirt_triangles.reserve(layout.skirt_triangle_count());
        }
        arena
    }

    /// Skirt vertices carry no UV
    pub fn set_vertex(&mut self, vertex: VertexRef, position: Vec3, uv: Vec2) {
        match vertex {
            VertexRef::Interior(i) => {
                self.positions[i as usize] = position;
                self.uvs[i as usize] = uv;
            }
            VertexRef::Skirt(i) => self.skirt_positions[i as usize] = position,
        }
    }

    pub fn position(&self, vertex: VertexRef) -> Vec3 {
        match vertex {
            VertexRef::Interior(i) => self.positions[i as usize],
            VertexRef::Skirt(i) => self.skirt_positions[i as usize],
        }
    }

    pub fn add_triangle(&mut self, a: VertexRef, b: VertexRef, c: VertexRef) {
        match (a, b, c) {
            (VertexRef::Interior(a), VertexRef::Interior(b), VertexRef::Interior(c)) => {
                self.triangles.extend_from_slice(&[a, b, c]);
            }
            _ => self.skirt_triangles.push([a, b, c]),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn skirt_triangle_count(&self) -> usize {
        self.skirt_triangles.len()
    }

    /// Smooth normals for the interior vertices. Every triangle adds its
    /// face normal to its corners; skirt triangles only feed interior corners.
    pub fn bake_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.triangles.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(VertexRef::Interior);
            let normal = self.surface_normal(a, b, c);
            for index in [tri[0], tri[1], tri[2]] {
                normals[index as usize] += normal;
            }
        }

        for &[a, b, c] in &self.skirt_triangles {
            let normal = self.surface_normal(a, b, c);
            for vertex in [a, b, c] {
                if let VertexRef::Interior(index) = vertex {
                    normals[index as usize] += normal;
                }
            }
        }

        normals.iter().map(|normal| normal.normalize_or_zero()).collect()
    }

    fn surface_normal(&self, a: VertexRef, b: VertexRef, c: VertexRef) -> Vec3 {
        let point_a = self.position(a);
        let ab = self.position(b) - point_a;
        let ac = self.position(c) - point_a;
        ab.cross(ac).normalize_or_zero()
    }

    pub fn into_parts(self) -> (Vec<Vec3>, Vec<Vec2>, Vec<u32>) {
        (self.positions, self.uvs, self.triangles)
    }
}
