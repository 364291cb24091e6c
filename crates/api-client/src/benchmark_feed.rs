// In crates/api-client/src/benchmark_feed.rs

use app_config::types::BenchmarkSettings;
use async_trait::async_trait;
use core_types::{BenchmarkTable, Ticker};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::types::AlphaVantageFeed;
use crate::{BenchmarkFeed, Error, Result};

/// Top-level keys Alpha Vantage uses instead of data when a call is refused.
const FEED_ERROR_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

impl AlphaVantageFeed {
    pub fn new(settings: &BenchmarkSettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(AlphaVantageFeed {
            http_client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            function: settings.function.clone(),
        })
    }

    async fn fetch_data(&self, symbol: &str) -> Result<String> {
        let params = [
            ("function", self.function.as_str()),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        let url = reqwest::Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| Error::CustomError(format!("Failed to build URL: {}", e)))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        if !response.status().is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::FeedError(format!("AlphaVantage API error: {}", error_body)));
        }

        response.text().await.map_err(Error::RequestFailed)
    }
}

#[async_trait]
impl BenchmarkFeed for AlphaVantageFeed {
    fn name(&self) -> &'static str {
        "AlphaVantage"
    }

    async fn monthly_prices(&self, ticker: &Ticker) -> Result<BenchmarkTable> {
        tracing::debug!(%ticker, function = %self.function, "Fetching benchmark series.");
        let body = self.fetch_data(&ticker.0).await?;
        parse_time_series(&body)
    }
}

/// Extracts the date-keyed price table from an Alpha Vantage time series body.
///
/// The series sits under a key such as `"Monthly Adjusted Time Series"`; the
/// `"Meta Data"` block is ignored. Rate-limit notes and error messages are
/// turned into `FeedError`.
pub fn parse_time_series(body: &str) -> Result<BenchmarkTable> {
    let value: Value = serde_json::from_str(body).map_err(Error::DeserializationFailed)?;

    for key in FEED_ERROR_KEYS {
        if let Some(msg) = value.get(key).and_then(Value::as_str) {
            return Err(Error::FeedError(msg.to_string()));
        }
    }

    let series = value
        .as_object()
        .and_then(|obj| obj.iter().find(|(key, _)| key.contains("Time Series")))
        .map(|(_, series)| series.clone())
        .ok_or_else(|| Error::FeedError("Response contains no time series".to_string()))?;

    serde_json::from_value(series).map_err(Error::DeserializationFailed)
}
