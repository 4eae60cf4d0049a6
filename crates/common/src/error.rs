//! Common error types for Pingmon components.

use std::fmt;

/// A specialized Result type for Pingmon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Pingmon operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resolve error: {0}")]
    Resolve(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("All probe processes have died")]
    AllProbesDead,
}

impl Error {
    /// Create a new resolve error.
    pub fn resolve(msg: impl fmt::Display) -> Self {
        Error::Resolve(msg.to_string())
    }

    /// Create a new configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new probe error.
    pub fn probe(msg: impl fmt::Display) -> Self {
        Error::Probe(msg.to_string())
    }

    /// Create a new render error.
    pub fn render(msg: impl fmt::Display) -> Self {
        Error::Render(msg.to_string())
    }
}
