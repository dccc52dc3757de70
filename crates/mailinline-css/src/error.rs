//! Error types for stylesheet loading and inlining.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or inlining CSS.
#[derive(Debug, Error)]
pub enum Error {
    /// A stylesheet file could not be read.
    #[error("Failed to read stylesheet {}: {source}", path.display())]
    Stylesheet {
        /// Path as it was given to the loader.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the HTML document back out failed.
    #[error("Failed to serialize HTML: {0}")]
    Serialize(#[source] std::io::Error),

    /// A pluggable inline engine failed.
    #[error(transparent)]
    Engine(Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
