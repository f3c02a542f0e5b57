//! Error types for Mintshot Core
//!
//! Two layers:
//! - `ServiceError` is what a collaborator (sheet, repository, discovery
//!   API, renderer, uploader) reports at its trait boundary
//! - `PipelineError` names the unit of work that failed and carries the
//!   underlying `ServiceError`

use std::time::Duration;

use crate::config::ConfigError;
use crate::types::RowIndex;

/// Boxed error used to carry adapter-specific causes across the trait seam
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by an external collaborator
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("request failed: {0}")]
    Request(String),

    /// Collaborator answered with a non-success status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response could not be decoded into the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Credentials rejected or unavailable
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Call exceeded its time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Local resource failure (process spawn, temp files, codec)
    #[error("local failure: {0}")]
    Local(String),

    /// Adapter-specific error without a closer mapping
    #[error(transparent)]
    Other(BoxError),
}

impl ServiceError {
    /// Wrap any adapter error
    #[inline]
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }

    /// Check if the failure was a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Reading the candidate rows failed; aborts the run
    #[error("range read failed for {range}: {source}")]
    RangeRead {
        range: String,
        #[source]
        source: ServiceError,
    },

    /// Asset listing failed for a wallet
    #[error("asset discovery failed for {wallet}: {source}")]
    Discovery {
        wallet: String,
        #[source]
        source: ServiceError,
    },

    /// Event history query failed for one asset
    #[error("event query failed for {contract_address}/{token_id}: {source}")]
    EventQuery {
        contract_address: String,
        token_id: String,
        #[source]
        source: ServiceError,
    },

    /// Rendering one URL failed
    #[error("render failed for {url}: {source}")]
    Render {
        url: String,
        #[source]
        source: ServiceError,
    },

    /// Uploading one rendered image failed
    #[error("upload failed for {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: ServiceError,
    },

    /// A result cell write failed; remaining cells of the batch were not attempted
    #[error("sheet write failed at {cell} after {written} cell(s): {source}")]
    SheetWrite {
        cell: String,
        written: usize,
        #[source]
        source: ServiceError,
    },

    /// Status cell write failed
    #[error("status write failed for row {row}: {source}")]
    StatusWrite {
        row: RowIndex,
        #[source]
        source: ServiceError,
    },

    /// Image repository read or write failed
    #[error("image repository failure at {path}: {source}")]
    Repository {
        path: String,
        #[source]
        source: ServiceError,
    },

    /// Malformed A1 range or cell reference
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Check if the error aborts the whole run rather than one unit of work
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RangeRead { .. } | Self::InvalidRange(_) | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_write_error_display() {
        let err = PipelineError::SheetWrite {
            cell: "Q7".to_string(),
            written: 0,
            source: ServiceError::Status {
                status: 403,
                body: "forbidden".to_string(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("Q7"));
        assert!(text.contains("403"));
    }

    #[test]
    fn only_run_level_errors_are_fatal() {
        let range = PipelineError::RangeRead {
            range: "O2:P".to_string(),
            source: ServiceError::Request("connection reset".to_string()),
        };
        assert!(range.is_fatal());

        let render = PipelineError::Render {
            url: "https://example.test/a".to_string(),
            source: ServiceError::Timeout(Duration::from_secs(30)),
        };
        assert!(!render.is_fatal());
    }

    #[test]
    fn timeout_detection() {
        assert!(ServiceError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!ServiceError::Auth("expired".to_string()).is_timeout());
    }
}
