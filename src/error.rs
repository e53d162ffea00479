//! Error types for simcast

use thiserror::Error;

/// Result type alias using SimcastError
pub type Result<T> = std::result::Result<T, SimcastError>;

/// Main error type for simcast operations
///
/// Nothing in this crate treats an error as fatal: every operational failure
/// is logged and degrades to "that consumer is now inactive". These types
/// exist so call sites can decide what to log and what to skip.
#[derive(Debug, Error)]
pub enum SimcastError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Streaming backend error (pipeline launch, transport failure)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Encoder error from the in-process pipeline
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Camera name not known to the simulator
    #[error("Camera not found: {0}")]
    CameraNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SimcastError>,
    },
}

impl SimcastError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an encoder error
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl From<ffmpeg_next::Error> for SimcastError {
    fn from(err: ffmpeg_next::Error) -> Self {
        Self::Encoder(err.to_string())
    }
}
