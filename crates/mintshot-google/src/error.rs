//! Error type for the Google adapters

use mintshot_core::ServiceError;

/// Google adapter error
#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    /// Transport failure
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Body did not have the expected shape
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// Token endpoint refused or no credentials to refresh with
    #[error("oauth: {0}")]
    Auth(String),

    /// Base URL cannot carry path segments
    #[error("invalid url {0}")]
    Url(String),

    /// Client could not be built
    #[error("http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl GoogleError {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { service, source }
    }

    pub(crate) fn decode(service: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            service,
            message: message.to_string(),
        }
    }

    /// Status code of a rejected request
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<GoogleError> for ServiceError {
    fn from(err: GoogleError) -> Self {
        match err {
            GoogleError::Http { source, .. } if source.is_timeout() => {
                ServiceError::Request(format!("timed out: {source}"))
            }
            GoogleError::Http { service, source } => {
                ServiceError::Request(format!("{service}: {source}"))
            }
            GoogleError::Status { status, body, .. } => ServiceError::Status { status, body },
            GoogleError::Decode { service, message } => {
                ServiceError::Malformed(format!("{service}: {message}"))
            }
            GoogleError::Auth(message) => ServiceError::Auth(message),
            err @ (GoogleError::Url(_) | GoogleError::Client(_)) => ServiceError::other(err),
        }
    }
}
