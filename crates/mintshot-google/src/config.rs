//! Adapter configuration

use std::time::Duration;

/// Default request timeout for every Google endpoint
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth2 client credentials and tokens
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Long-lived token used to mint access tokens
    pub refresh_token: Option<String>,
    /// Access token to use until it is rejected or replaced
    pub access_token: Option<String>,
    pub token_url: String,
    pub timeout: Duration,
}

impl OAuthConfig {
    pub const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Create config for an installed or web OAuth client
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            refresh_token: None,
            access_token: None,
            token_url: Self::TOKEN_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sheets v4 endpoint
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl SheetsConfig {
    pub const BASE_URL: &'static str = "https://sheets.googleapis.com";

    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: Self::BASE_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Realtime Database instance
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// e.g. `https://<project>-default-rtdb.firebaseio.com`
    pub url: String,
    /// Database secret or ID token sent as the `auth` parameter
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl DatabaseConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Storage bucket
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// e.g. `<project>.appspot.com`
    pub bucket: String,
    pub base_url: String,
    /// Bearer token for buckets whose rules require auth
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl StorageConfig {
    pub const BASE_URL: &'static str = "https://firebasestorage.googleapis.com";

    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            base_url: Self::BASE_URL.to_string(),
            auth_token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
