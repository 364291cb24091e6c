// In crates/api-client/src/asset_api.rs

use app_config::types::AssetApiSettings;
use async_trait::async_trait;
use core_types::TradeRecord;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::types::{AssetApiClient, AssetQuery, UploadSummary};
use crate::{Error, Result, TradeRecordSource};

impl AssetApiClient {
    /// Constructs a new AssetApiClient from AssetApiSettings.
    pub fn new(settings: &AssetApiSettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(AssetApiClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches trade records.
    ///
    /// This corresponds to the `GET /assets` endpoint.
    pub async fn get_assets(&self, query: &AssetQuery) -> Result<Vec<TradeRecord>> {
        let url = format!("{}/assets", self.base_url);
        let query = query.clone().normalized();

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        let records: Vec<TradeRecord> =
            serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        tracing::debug!(count = records.len(), ?query, "Fetched trade records.");
        Ok(records)
    }

    /// Uploads a spreadsheet of trade records.
    ///
    /// This corresponds to the `POST /assets/upload` endpoint; the file goes
    /// into the multipart field `file`.
    pub async fn upload_asset_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadSummary> {
        let url = format!("{}/assets/upload", self.base_url);
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        let summary: UploadSummary =
            serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        tracing::info!(
            file_name,
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "Upload accepted by asset API."
        );
        Ok(summary)
    }

    /// Reads `path` from disk and uploads it under its file name.
    pub async fn upload_asset_path(&self, path: &Path) -> Result<UploadSummary> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::CustomError(format!("Not a file path: {}", path.display())))?;
        self.upload_asset_file(file_name, bytes).await
    }
}

#[async_trait]
impl TradeRecordSource for AssetApiClient {
    async fn fetch_records(&self, query: &AssetQuery) -> Result<Vec<TradeRecord>> {
        self.get_assets(query).await
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadSummary> {
        self.upload_asset_file(file_name, bytes).await
    }
}

/// Builds an `ApiError` from a non-success response.
///
/// The asset API puts a human-readable `message` into its error bodies; when
/// that is missing the raw body is used, and for an empty body the status
/// text.
pub fn api_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    Error::ApiError { status: status.as_u16(), message }
}
