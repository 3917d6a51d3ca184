use crate::constants::mesh::MIN_VERTICES_PER_LINE;

/// Mesh construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("Grid of {vertices_per_line} vertices per line is too small (minimum {})", MIN_VERTICES_PER_LINE)]
    GridTooSmall { vertices_per_line: usize },

    #[error("Skip increment {skip} does not divide {vertices_per_line} - 5 vertices per line")]
    UnsupportedSkip { vertices_per_line: usize, skip: usize },

    #[error("Height grid is {width}x{height} but the mesh needs {required}x{required}")]
    GridSizeMismatch {
        width: usize,
        height: usize,
        required: usize,
    },

    #[error("No vertex at quad corner ({x}, {y})")]
    MissingVertex { x: usize, y: usize },
}
