//! Storage uploads returning download-token URLs

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Url};
use serde::Deserialize;

use mintshot_core::{BlobUploader, ServiceError};

use crate::config::StorageConfig;
use crate::error::GoogleError;
use crate::http;

const SERVICE: &str = "storage";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Blob uploader for a Storage bucket
#[derive(Debug, Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    auth_token: Option<String>,
}

impl FirebaseStorage {
    /// # Errors
    /// `GoogleError::Client` when the HTTP client cannot be built
    pub fn new(config: &StorageConfig) -> Result<Self, GoogleError> {
        Ok(Self {
            http: http::client(config.timeout)?,
            base_url: config.base_url.clone(),
            bucket: config.bucket.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn objects_url(&self) -> Result<Url, GoogleError> {
        http::join_segments(&self.base_url, ["v0", "b", self.bucket.as_str(), "o"])
    }

    /// Public URL of an object, tokenized when the bucket issued a token
    fn download_url(&self, meta: &ObjectMetadata) -> Result<String, GoogleError> {
        let mut url = http::join_segments(
            &self.base_url,
            ["v0", "b", self.bucket.as_str(), "o", meta.name.as_str()],
        )?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(token) = meta
                .download_tokens
                .as_deref()
                .and_then(|tokens| tokens.split(',').next())
            {
                query.append_pair("token", token);
            }
        }
        Ok(url.into())
    }

    /// Upload `bytes` to `path` and return its public URL
    ///
    /// # Errors
    /// Any transport, status or decode failure
    pub async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GoogleError> {
        let mut request = self
            .http
            .post(self.objects_url()?)
            .query(&[("uploadType", "media"), ("name", path)])
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(GoogleError::http(SERVICE))?;
        let meta: ObjectMetadata = http::check(SERVICE, resp)
            .await?
            .json()
            .await
            .map_err(|e| GoogleError::decode(SERVICE, e))?;
        self.download_url(&meta)
    }
}

#[async_trait]
impl BlobUploader for FirebaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ServiceError> {
        Ok(self.put_object(path, bytes, content_type).await?)
    }
}
