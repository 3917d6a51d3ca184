//! Crate-wide error handling
//!
//! Subsystems define their own `thiserror` enums (`MeshError`, `ComputeError`)
//! and fold into `TerrainError` at the public API boundary.

use crate::mesh::MeshError;
use crate::thread_pool::ComputeError;

/// Result alias used throughout the crate
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Top level error type
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to read config '{path}': {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse { path: String, message: String },

    #[error("Unknown config format for '{path}' (expected .toml or .json)")]
    UnknownConfigFormat { path: String },

    #[error("Failed to watch '{path}': {error}")]
    Watch { path: String, error: String },

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error("{resource_type} not found: {id}")]
    ResourceNotFound { resource_type: String, id: String },

    #[error("System error in {component}: {error}")]
    SystemError { component: String, error: String },
}

impl TerrainError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        TerrainError::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_error_converts_transparently() {
        let error: TerrainError = MeshError::GridTooSmall {
            vertices_per_line: 3,
        }
        .into();
        assert!(matches!(error, TerrainError::Mesh(_)));
        assert!(error.to_string().contains("3"));
    }

    #[test]
    fn test_invalid_config_message() {
        let error = TerrainError::invalid_config("lod table is empty");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: lod table is empty"
        );
    }
}
