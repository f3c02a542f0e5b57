//! Error type for the Element adapter

use mintshot_core::ServiceError;

/// Element API error
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    /// Transport failure
    #[error("element request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("element returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Envelope with a non-zero code
    #[error("element api error {code}: {message}")]
    Api { code: i64, message: String },

    /// Body did not have the expected shape
    #[error("element response could not be decoded: {0}")]
    Decode(String),

    /// Base URL unusable
    #[error("invalid url {0}")]
    Url(String),
}

impl From<ElementError> for ServiceError {
    fn from(err: ElementError) -> Self {
        match err {
            ElementError::Http(source) => ServiceError::Request(source.to_string()),
            ElementError::Status { status, body } => ServiceError::Status { status, body },
            ElementError::Api { code: 401 | 403, message } => ServiceError::Auth(message),
            ElementError::Api { .. } | ElementError::Decode(_) => {
                ServiceError::Malformed(err.to_string())
            }
            ElementError::Url(_) => ServiceError::other(err),
        }
    }
}
