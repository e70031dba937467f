//! Error types shared across MangaReel crates.

use std::path::PathBuf;

/// Top-level error type for MangaReel operations.
///
/// Stage variants render the message each pipeline stage reports when its
/// remote or local dependency fails. [`MangareelError::VideoCreation`] wraps
/// whichever stage error aborted a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum MangareelError {
    #[error("Failed to generate script: {message}")]
    Script { message: String },

    #[error("Failed to generate image for prompt '{prompt}': {message}")]
    Image { prompt: String, message: String },

    #[error("Failed to generate narration: {message}")]
    Narration { message: String },

    #[error("Failed to assemble video: {message}")]
    Assembly { message: String },

    #[error("Video creation failed: {cause}")]
    VideoCreation {
        #[source]
        cause: Box<MangareelError>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid API response: {message}")]
    InvalidResponse { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MangareelError.
pub type MangareelResult<T> = Result<T, MangareelError>;

impl MangareelError {
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script {
            message: msg.into(),
        }
    }

    pub fn image(prompt: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Image {
            prompt: prompt.into(),
            message: msg.into(),
        }
    }

    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration {
            message: msg.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Wrap a stage failure as the error of a whole pipeline run.
    pub fn video_creation(cause: MangareelError) -> Self {
        Self::VideoCreation {
            cause: Box::new(cause),
        }
    }
}
