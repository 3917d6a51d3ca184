//! Background compute error handling

/// Failure of one background job, delivered to its continuation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    #[error("Task '{label}' panicked: {message}")]
    TaskPanicked { label: String, message: String },

    #[error("Task '{label}' failed: {message}")]
    TaskFailed { label: String, message: String },

    #[error("Task '{label}' could not be started: {message}")]
    SpawnFailed { label: String, message: String },
}

impl ComputeError {
    pub fn label(&self) -> &str {
        match self {
            ComputeError::TaskPanicked { label, .. }
            | ComputeError::TaskFailed { label, .. }
            | ComputeError::SpawnFailed { label, .. } => label,
        }
    }
}

/// Readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
