//! Error types for the terrain engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Height source error: {0}")]
    HeightSource(String),

    #[error("Mesh error: {0}")]
    Mesh(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
