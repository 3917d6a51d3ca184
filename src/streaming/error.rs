//! Error helpers for the streaming subsystem

use crate::error::{TerrainError, TerrainResult};

/// Streaming-specific result type
pub type StreamingResult<T> = TerrainResult<T>;

/// Error context for streaming operations
pub trait StreamingErrorContext<T> {
    fn streaming_context(self, context: &str) -> StreamingResult<T>;
}

impl<T> StreamingErrorContext<T> for Option<T> {
    fn streaming_context(self, context: &str) -> StreamingResult<T> {
        self.ok_or_else(|| TerrainError::ResourceNotFound {
            resource_type: "chunk".to_string(),
            id: context.to_string(),
        })
    }
}

impl<T, E> StreamingErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn streaming_context(self, context: &str) -> StreamingResult<T> {
        self.map_err(|e| TerrainError::SystemError {
            component: "streaming".to_string(),
            error: format!("{}: {}", context, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_context_reports_missing_chunk() {
        let missing: Option<u8> = None;
        let err = missing.streaming_context("(3, -1)").unwrap_err();
        assert_eq!(err.to_string(), "chunk not found: (3, -1)");
        assert_eq!(Some(7).streaming_context("unused").unwrap(), 7);
    }

    #[test]
    fn test_result_context_wraps_message() {
        let failed: Result<(), &str> = Err("boom");
        let err = failed.streaming_context("height job").unwrap_err();
        assert!(matches!(err, TerrainError::SystemError { .. }));
        assert!(err.to_string().contains("height job: boom"));
    }
}
