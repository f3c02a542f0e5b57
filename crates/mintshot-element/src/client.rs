//! Element open API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use mintshot_core::{Asset, AssetDiscovery, AssetEvent, EventQuery, ServiceError};

use crate::error::ElementError;
use crate::model::{AssetEventData, AssetListData, Envelope};

/// Client settings
#[derive(Debug, Clone)]
pub struct ElementConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ElementConfig {
    pub const BASE_URL: &'static str = "https://api.element.market/openapi/v1";

    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
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
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Asset discovery over the Element open API
#[derive(Debug, Clone)]
pub struct ElementClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl ElementClient {
    pub const API_KEY_HEADER: &'static str = "X-Api-Key";

    /// # Errors
    /// `ElementError::Url` for an unusable base URL, `ElementError::Http`
    /// when the client cannot be built
    pub fn new(config: &ElementConfig) -> Result<Self, ElementError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ElementError::Url(format!("{base}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(format!("mintshot/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    async fn get<T: DeserializeOwned + Default>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ElementError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ElementError::Url(format!("{endpoint}: {e}")))?;
        let resp = self
            .http
            .get(url)
            .header(Self::API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ElementError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| ElementError::Decode(e.to_string()))?;
        if envelope.code != 0 {
            return Err(ElementError::Api {
                code: envelope.code,
                message: envelope.msg.unwrap_or_default(),
            });
        }
        Ok(envelope.data.unwrap_or_default())
    }

    /// Assets held by `wallet`
    ///
    /// # Errors
    /// Transport, status, envelope or decode failures
    pub async fn asset_list(
        &self,
        chain: &str,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<Asset>, ElementError> {
        let data: AssetListData = self
            .get(
                "account/assetList",
                &[
                    ("chain", chain.to_string()),
                    ("wallet_address", wallet.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let assets: Vec<Asset> = data
            .asset_list
            .into_iter()
            .filter_map(|item| item.asset.map(Asset::from))
            .collect();
        tracing::debug!(wallet, count = assets.len(), "listed assets");
        Ok(assets)
    }

    /// Events of one asset inside the query window
    ///
    /// Events carrying a time outside the window are dropped even if the
    /// API returned them.
    ///
    /// # Errors
    /// Transport, status, envelope or decode failures
    pub async fn asset_events(
        &self,
        chain: &str,
        query: &EventQuery,
    ) -> Result<Vec<AssetEvent>, ElementError> {
        let data: AssetEventData = self
            .get(
                "asset/assetEvents",
                &[
                    ("chain", chain.to_string()),
                    ("contract_address", query.contract_address.clone()),
                    ("token_id", query.token_id.clone()),
                    ("limit", query.limit.to_string()),
                    ("from_time", query.window.from.to_string()),
                    ("to_time", query.window.to.to_string()),
                ],
            )
            .await?;

        Ok(data
            .asset_event_list
            .into_iter()
            .filter_map(|item| item.asset_event.map(AssetEvent::from))
            .filter(|event| event.event_time.map_or(true, |t| query.window.contains(t)))
            .collect())
    }
}

#[async_trait]
impl AssetDiscovery for ElementClient {
    async fn list_assets(
        &self,
        chain: &str,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<Asset>, ServiceError> {
        Ok(self.asset_list(chain, wallet, limit).await?)
    }

    async fn list_events(
        &self,
        chain: &str,
        query: &EventQuery,
    ) -> Result<Vec<AssetEvent>, ServiceError> {
        Ok(self.asset_events(chain, query).await?)
    }
}
