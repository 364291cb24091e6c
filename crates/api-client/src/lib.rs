// In crates/api-client/src/lib.rs

use async_trait::async_trait;
use core_types::{BenchmarkTable, Ticker, TradeRecord};

pub mod asset_api;
pub mod benchmark_feed;
pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// A source of trade records, normally the asset API.
#[async_trait]
pub trait TradeRecordSource: Send + Sync {
    /// Fetches the records matching `query`; an empty query returns everything.
    async fn fetch_records(&self, query: &AssetQuery) -> Result<Vec<TradeRecord>>;

    /// Hands a spreadsheet to the source for import.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadSummary>;
}

/// A monthly benchmark price feed.
#[async_trait]
pub trait BenchmarkFeed: Send + Sync {
    /// The name of the feed (e.g., "AlphaVantage").
    fn name(&self) -> &'static str;

    /// Fetches the monthly price table for `ticker`.
    async fn monthly_prices(&self, ticker: &Ticker) -> Result<BenchmarkTable>;
}
