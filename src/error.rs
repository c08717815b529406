//! Error types for shortsmith.

use crate::job::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShortsmithError {
    // Submission validation errors — the job is never created
    #[error("Invalid request for {field}: {message}")]
    Validation { field: String, message: String },

    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing credential: {key} is not set")]
    MissingCredential { key: String },

    // Generation provider errors — terminal for the job
    #[error("{stage} generation failed: {message}")]
    Provider { stage: Stage, message: String },

    // Duration reconciliation errors — terminal for the job
    #[error("Cannot reconcile durations: {message}")]
    Reconciliation { message: String },

    // Composition errors — terminal for the job
    #[error("Composition failed: {message}")]
    Composition { message: String },

    // Media decoding/encoding errors
    #[error("Failed to read media at {path}: {message}")]
    MediaRead { path: String, message: String },

    #[error("Failed to write media at {path}: {message}")]
    MediaWrite { path: String, message: String },

    // External tool errors (ffmpeg/ffprobe)
    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    // Caller-facing lookup errors — not job failures
    #[error("No job with id {id}")]
    NotFound { id: String },

    #[error("Job {id} has no final artifact yet (status: {status})")]
    NotReady { id: String, status: String },

    // Job was cancelled between stages
    #[error("Job cancelled")]
    Cancelled,

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ShortsmithError>;

impl ShortsmithError {
    /// Wrap any lower-level error as a provider failure for the given stage.
    pub fn provider(stage: Stage, err: impl std::fmt::Display) -> Self {
        ShortsmithError::Provider {
            stage,
            message: err.to_string(),
        }
    }
}
