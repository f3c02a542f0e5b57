//! OAuth2 access tokens
//!
//! The provider caches one access token. A cached token is reused until it
//! is within [`EXPIRY_MARGIN`] of its expiry or a caller invalidates it
//! after a 401, after which the next request refreshes with the stored
//! refresh token.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::OAuthConfig;
use crate::error::GoogleError;
use crate::http;

/// Refresh this long before the reported expiry
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const SERVICE: &str = "oauth";

/// Token endpoint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    /// `None` for seeded tokens of unknown lifetime
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at
            .map_or(true, |at| now + EXPIRY_MARGIN < at)
    }
}

/// Access token source shared by every Google client
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    config: OAuthConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create provider, seeding the cache with the configured access token
    ///
    /// # Errors
    /// `GoogleError::Client` when the HTTP client cannot be built
    pub fn new(config: OAuthConfig) -> Result<Self, GoogleError> {
        let cached = config.access_token.clone().map(|value| CachedToken {
            value,
            expires_at: None,
        });
        Ok(Self {
            http: http::client(config.timeout)?,
            config,
            cached: Mutex::new(cached),
        })
    }

    /// A usable access token, refreshing when the cached one is stale
    ///
    /// # Errors
    /// `GoogleError::Auth` when no refresh token is configured or the token
    /// endpoint refuses the refresh
    pub async fn access_token(&self) -> Result<String, GoogleError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        let refresh_token = self
            .config
            .refresh_token
            .as_deref()
            .ok_or_else(|| GoogleError::Auth("no refresh token configured".to_string()))?;

        let tokens = self
            .request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .await?;
        tracing::info!(expires_in = ?tokens.expires_in, "refreshed access token");

        let token = CachedToken {
            value: tokens.access_token,
            expires_at: tokens
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call refreshes
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Trade a one-time authorization code for a token set
    ///
    /// The returned set carries the refresh token to persist as
    /// `REFRESH_TOKEN`. Its access token also replaces the cached one.
    ///
    /// # Errors
    /// `GoogleError::Auth` when the code is rejected
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, GoogleError> {
        let tokens = self
            .request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        *self.cached.lock().await = Some(CachedToken {
            value: tokens.access_token.clone(),
            expires_at: tokens
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        });
        Ok(tokens)
    }

    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenSet, GoogleError> {
        let resp = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(GoogleError::http(SERVICE))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorBody>(&body).map_or_else(
                |_| format!("token endpoint returned {}", status.as_u16()),
                |e| match e.error_description {
                    Some(desc) => format!("{}: {desc}", e.error),
                    None => e.error,
                },
            );
            return Err(GoogleError::Auth(message));
        }

        resp.json::<TokenSet>()
            .await
            .map_err(|e| GoogleError::decode(SERVICE, e))
    }
}
