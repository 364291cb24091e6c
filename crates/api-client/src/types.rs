// In crates/api-client/src/types.rs

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// The client for the asset API that stores uploaded trade records.
#[derive(Debug, Clone)]
pub struct AssetApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL of the asset API, without a trailing slash.
    pub base_url: String,
}

/// The client for the Alpha Vantage monthly price feed.
#[derive(Debug, Clone)]
pub struct AlphaVantageFeed {
    pub http_client: Client,
    pub base_url: String,
    pub api_key: String,
    /// The time series function, e.g. `TIME_SERIES_MONTHLY_ADJUSTED`.
    pub function: String,
}

/// Optional server-side filters for `GET /assets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_ticker: Option<String>,
}

impl AssetQuery {
    /// Drops empty strings so they are not sent as `?bank=`.
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            bank: keep(self.bank),
            portfolio: keep(self.portfolio),
            trade_ticker: keep(self.trade_ticker),
        }
    }
}

/// The asset API's answer to a spreadsheet upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
    /// Row-level error details, passed through untouched.
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}
