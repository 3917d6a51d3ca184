use super::error::MeshError;
use crate::generation::NoiseField;
use crate::heightmap::{grid_sample_point, HeightGrid};
use crate::streaming::ChunkCoord;
use glam::Vec2;

/// Where a mesh build reads its heights from
#[derive(Debug, Clone, Copy)]
pub enum ElevationSource<'a> {
    /// Precomputed grid, scaled by its own height multiplier
    Grid(&'a HeightGrid),
    /// Noise evaluated per vertex on the same lattice a grid would use
    Noise {
        field: &'a NoiseField,
        height_multiplier: f32,
    },
}

/// An `ElevationSource` bound to one chunk's grid
pub(crate) struct ElevationSampler<'a> {
    source: ElevationSource<'a>,
    sample_centre: Vec2,
    vertices_per_line: usize,
}

impl<'a> ElevationSampler<'a> {
    pub(crate) fn bind(
        source: ElevationSource<'a>,
        coord: ChunkCoord,
        vertices_per_line: usize,
    ) -> Result<Self, MeshError> {
        if let ElevationSource::Grid(grid) = source {
            if grid.width() != vertices_per_line || grid.height() != vertices_per_line {
                return Err(MeshError::GridSizeMismatch {
                    width: grid.width(),
                    height: grid.height(),
                    required: vertices_per_line,
                });
            }
        }

        Ok(Self {
            source,
            sample_centre: coord.sample_centre(vertices_per_line),
            vertices_per_line,
        })
    }

    pub(crate) fn height(&self, x: usize, y: usize) -> f32 {
        match self.source {
            ElevationSource::Grid(grid) => grid.elevation(x, y),
            ElevationSource::Noise {
                field,
                height_multiplier,
            } => {
                let n = self.vertices_per_line;
                field.evaluate_2d(grid_sample_point(self.sample_centre, x, y, n, n)) * height_multiplier
            }
        }
    }
}
