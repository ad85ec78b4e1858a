//! Error types for the chaos scheduler.

use thiserror::Error;

/// Error type for chaos sessions.
#[derive(Error, Debug)]
pub enum ChaosError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Audio data the renderer cannot handle.
    #[error("unsupported audio: {0}")]
    Audio(String),

    /// Runner thread is gone.
    #[error("chaos runner has stopped")]
    Disconnected,

    /// Runner thread panicked.
    #[error("chaos runner panicked")]
    Panicked,
}

/// Result type for chaos sessions.
pub type ChaosResult<T> = Result<T, ChaosError>;
