//! Build and programming errors.

use std::path::PathBuf;

use k9_platform::PlatformError;
use k9_soc::ElaborationError;
use thiserror::Error;

/// Errors that can occur while building or programming a bitstream.
///
/// External tool failures are fatal; nothing is retried.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A tool ran and exited unsuccessfully.
    #[error("{tool} failed with exit status {status}")]
    ToolFailed { tool: String, status: i32 },

    /// A tool is not installed or not on `PATH`.
    #[error("{tool} not found; is it installed and on PATH?")]
    ToolMissing { tool: String },

    /// An expected output file does not exist.
    #[error("missing artifact: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("elaboration failed: {0}")]
    Elaboration(#[from] ElaborationError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
