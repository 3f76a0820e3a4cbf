use std::sync::Arc;

/// Result type used throughout the crate, with [`Error`] as the error variant.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a simulation.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A required external parameter is missing or invalid. Fatal: reported
    /// before any journeys run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record could not be serialized for the sink or the assignment log.
    #[error(transparent)]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    Serialization(Arc<serde_json::Error>),

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(value))
    }
}
