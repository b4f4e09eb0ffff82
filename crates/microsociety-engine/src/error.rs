//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of engine startup and shutdown
//! so `main` can propagate them with `?`.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: microsociety_core::ConfigError,
    },

    /// Simulation setup failed.
    #[error("simulation setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: microsociety_core::TickError,
    },

    /// Agent spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },

    /// A policy file could not be read or written.
    #[error("policy file {path}: {source}")]
    PolicyIo {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A policy file held malformed JSON.
    #[error("policy file {path}: {source}")]
    PolicyFormat {
        /// The file involved.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
