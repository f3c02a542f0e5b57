//! Sheets v4 values API

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};

use mintshot_core::{CellRef, ServiceError, SheetClient};

use crate::config::SheetsConfig;
use crate::error::GoogleError;
use crate::http;
use crate::oauth::TokenProvider;

const SERVICE: &str = "sheets";

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: String,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// Sheets client authenticated through a shared [`TokenProvider`]
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenProvider>,
}

impl SheetsClient {
    /// # Errors
    /// `GoogleError::Client` when the HTTP client cannot be built
    pub fn new(config: &SheetsConfig, tokens: Arc<TokenProvider>) -> Result<Self, GoogleError> {
        Ok(Self {
            http: http::client(config.timeout)?,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, GoogleError> {
        http::join_segments(
            &self.base_url,
            ["v4", "spreadsheets", spreadsheet_id, "values", range],
        )
    }

    /// Send with a bearer token; a 401 refreshes the token and retries once
    async fn send(
        &self,
        build: impl Fn(&reqwest::Client) -> RequestBuilder,
    ) -> Result<reqwest::Response, GoogleError> {
        let token = self.tokens.access_token().await?;
        let resp = build(&self.http)
            .bearer_auth(token)
            .send()
            .await
            .map_err(GoogleError::http(SERVICE))?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return http::check(SERVICE, resp).await;
        }

        tracing::debug!("access token rejected, refreshing");
        self.tokens.invalidate().await;
        let token = self.tokens.access_token().await?;
        let resp = build(&self.http)
            .bearer_auth(token)
            .send()
            .await
            .map_err(GoogleError::http(SERVICE))?;
        http::check(SERVICE, resp).await
    }

    /// Read `range` as rows of display strings
    ///
    /// # Errors
    /// Any transport, status or decode failure
    pub async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, GoogleError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let resp = self.send(|http| http.get(url.clone())).await?;
        let body: ValueRange = resp
            .json()
            .await
            .map_err(|e| GoogleError::decode(SERVICE, e))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Write `value` to a single cell, stored as typed (`RAW`)
    ///
    /// # Errors
    /// Any transport or status failure
    pub async fn update_cell(
        &self,
        spreadsheet_id: &str,
        cell: &str,
        value: &str,
    ) -> Result<(), GoogleError> {
        let url = self.values_url(spreadsheet_id, cell)?;
        let body = ValueUpdate {
            range: cell.to_string(),
            major_dimension: "ROWS",
            values: [[value]],
        };
        self.send(|http| {
            http.put(url.clone())
                .query(&[("valueInputOption", "RAW")])
                .json(&body)
        })
        .await?;
        tracing::debug!(cell, "cell updated");
        Ok(())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetClient for SheetsClient {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError> {
        Ok(self.get_values(spreadsheet_id, range).await?)
    }

    async fn write_cell(
        &self,
        spreadsheet_id: &str,
        cell: &CellRef,
        value: &str,
    ) -> Result<(), ServiceError> {
        Ok(self
            .update_cell(spreadsheet_id, &cell.to_string(), value)
            .await?)
    }
}
