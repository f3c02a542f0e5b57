//! Realtime Database image repository
//!
//! Records live at `nftImages/<wallet>/<row>/entry<seq>` and are read and
//! written through the `<path>.json` REST endpoints.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use mintshot_core::{DiscoveredImage, ImageKey, ImageRepository, RowIndex, ServiceError, WalletImages};

use crate::config::DatabaseConfig;
use crate::error::GoogleError;
use crate::http;

const SERVICE: &str = "database";

/// Image repository backed by a Realtime Database instance
#[derive(Debug, Clone)]
pub struct FirebaseImageRepository {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseImageRepository {
    /// # Errors
    /// `GoogleError::Client` when the HTTP client cannot be built
    pub fn new(config: &DatabaseConfig) -> Result<Self, GoogleError> {
        Ok(Self {
            http: http::client(config.timeout)?,
            base_url: config.url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn document_url(&self, path: &str) -> Result<Url, GoogleError> {
        let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if let Some(last) = segments.last_mut() {
            last.push_str(".json");
        }
        let mut url = http::join_segments(&self.base_url, segments.iter().map(String::as_str))?;
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    async fn read(&self, path: &str) -> Result<Value, GoogleError> {
        let url = self.document_url(path)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(GoogleError::http(SERVICE))?;
        http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(|e| GoogleError::decode(SERVICE, e))
    }

    /// Store `image` at `key`, replacing what was there
    ///
    /// # Errors
    /// Any transport or status failure
    pub async fn write(&self, key: &ImageKey, image: &DiscoveredImage) -> Result<(), GoogleError> {
        let url = self.document_url(&key.path())?;
        let resp = self
            .http
            .put(url)
            .json(image)
            .send()
            .await
            .map_err(GoogleError::http(SERVICE))?;
        http::check(SERVICE, resp).await?;
        Ok(())
    }

    /// Delete every record stored under `row` of `wallet`
    ///
    /// # Errors
    /// Any transport or status failure
    pub async fn delete_row(&self, wallet: &str, row: RowIndex) -> Result<(), GoogleError> {
        let url = self.document_url(&ImageKey::row_path(wallet, row))?;
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(GoogleError::http(SERVICE))?;
        http::check(SERVICE, resp).await?;
        tracing::debug!(wallet, row, "cleared stored images of row");
        Ok(())
    }

    /// Record at `key`, `None` when absent
    ///
    /// # Errors
    /// Any transport, status or decode failure
    pub async fn fetch(&self, key: &ImageKey) -> Result<Option<DiscoveredImage>, GoogleError> {
        match self.read(&key.path()).await? {
            Value::Null => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| GoogleError::decode(SERVICE, e)),
        }
    }

    /// Every record of `wallet`, grouped by row
    ///
    /// # Errors
    /// Any transport, status or decode failure
    pub async fn fetch_wallet(&self, wallet: &str) -> Result<WalletImages, GoogleError> {
        let value = self.read(&ImageKey::wallet_path(wallet)).await?;
        Ok(parse_wallet(wallet, value))
    }
}

/// Children of a node, keyed by name
///
/// Objects whose keys are small integers come back from the database as
/// arrays with `null` holes, so both forms are accepted.
fn children(value: Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_wallet(wallet: &str, value: Value) -> WalletImages {
    let mut out = WalletImages::new();
    for (row_key, row_value) in children(value) {
        let Ok(row) = row_key.parse::<RowIndex>() else {
            tracing::debug!(wallet, key = %row_key, "ignoring non-row node");
            continue;
        };
        for (entry_key, entry_value) in children(row_value) {
            let Some(sequence) = ImageKey::parse_entry_name(&entry_key) else {
                tracing::debug!(wallet, row, key = %entry_key, "ignoring non-entry node");
                continue;
            };
            match serde_json::from_value::<DiscoveredImage>(entry_value) {
                Ok(image) => {
                    out.entry(row).or_default().insert(sequence, image);
                }
                Err(err) => {
                    tracing::warn!(wallet, row, sequence, error = %err, "skipping malformed record");
                }
            }
        }
    }
    out
}

#[async_trait]
impl ImageRepository for FirebaseImageRepository {
    async fn put(&self, key: &ImageKey, image: &DiscoveredImage) -> Result<(), ServiceError> {
        Ok(self.write(key, image).await?)
    }

    async fn get(&self, key: &ImageKey) -> Result<Option<DiscoveredImage>, ServiceError> {
        Ok(self.fetch(key).await?)
    }

    async fn list_wallet(&self, wallet: &str) -> Result<WalletImages, ServiceError> {
        Ok(self.fetch_wallet(wallet).await?)
    }

    async fn clear_row(&self, wallet: &str, row: RowIndex) -> Result<(), ServiceError> {
        Ok(self.delete_row(wallet, row).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(token: &str) -> Value {
        json!({"preImageUrl": format!("https://p/{token}"), "contractAddress": "0xc", "tokenId": token})
    }

    #[test]
    fn wallet_object_form_is_grouped_by_row() {
        let value = json!({
            "7": {"entry2": record("b"), "entry1": record("a")},
            "3": {"entry1": record("c")},
        });
        let images = parse_wallet("0xw", value);

        assert_eq!(images.keys().copied().collect::<Vec<_>>(), vec![3, 7]);
        let row7: Vec<_> = images[&7].values().map(|i| i.token_id.as_str()).collect();
        assert_eq!(row7, vec!["a", "b"]);
    }

    #[test]
    fn wallet_array_form_skips_holes() {
        let value = json!([null, null, {"entry1": record("a")}]);
        let images = parse_wallet("0xw", value);
        assert_eq!(images.len(), 1);
        assert_eq!(images[&2][&1].token_id, "a");
    }

    #[test]
    fn unexpected_nodes_are_ignored() {
        let value = json!({
            "2": {"entry1": record("a"), "note": "x", "entry2": {"bogus": true}},
            "meta": {"entry1": record("b")},
        });
        let images = parse_wallet("0xw", value);
        assert_eq!(images.len(), 1);
        assert_eq!(images[&2].len(), 1);
    }

    #[test]
    fn null_wallet_is_empty() {
        assert!(parse_wallet("0xw", Value::Null).is_empty());
    }

    #[test]
    fn document_url_appends_json_and_auth() {
        let repo = FirebaseImageRepository::new(
            &DatabaseConfig::new("https://db.test").with_auth_token("secret"),
        )
        .unwrap();
        let url = repo
            .document_url(&ImageKey::new("0xw", 2, 1).path())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://db.test/nftImages/0xw/2/entry1.json?auth=secret"
        );
    }
}
