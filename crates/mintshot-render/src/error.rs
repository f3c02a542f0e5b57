//! Error type for the renderer

use std::path::PathBuf;
use std::time::Duration;

use mintshot_core::ServiceError;

/// Renderer error
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Browser could not be started
    #[error("failed to launch {executable}: {source}")]
    Launch {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Browser exceeded the render timeout and was killed
    #[error("browser timed out after {0:?}")]
    Timeout(Duration),

    /// Browser exited unsuccessfully
    #[error("browser exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    /// Browser exited cleanly without writing the screenshot
    #[error("no screenshot written to {0}")]
    MissingScreenshot(PathBuf),

    /// Profile or screenshot file handling
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Screenshot could not be decoded or re-encoded
    #[error("image codec: {0}")]
    Codec(#[from] image::ImageError),
}

impl From<RenderError> for ServiceError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout(limit) => ServiceError::Timeout(limit),
            other => ServiceError::Local(other.to_string()),
        }
    }
}
