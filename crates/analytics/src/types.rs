// In crates/analytics/src/types.rs

use chrono::NaiveDate;
use core_types::Ticker;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::selection::FilterSelection;

/// One point of the cumulative position curve, one per distinct trade date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub date: NaiveDate,
    /// Running sum of signed USD trade amounts up to and including `date`.
    pub value: Decimal,
    /// Running sum of signed quantities up to and including `date`.
    pub quantity: Decimal,
    /// Last known non-zero unit price.
    pub price_per_item: Decimal,
}

/// A benchmark observation aligned to a `PerformancePoint` by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    /// The benchmark price scaled so the series starts where the portfolio does.
    pub value: Decimal,
    /// Copied from the portfolio point on the same date.
    pub quantity: Decimal,
    /// The raw adjusted close that was matched.
    pub price_per_item: Decimal,
}

/// Everything the performance chart needs, tagged with the generation it was
/// computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceView {
    pub generation: u64,
    pub selection: FilterSelection,
    pub ticker: Option<Ticker>,
    pub portfolio: Vec<PerformancePoint>,
    pub benchmark: Vec<BenchmarkPoint>,
}

// --- Asset summary ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotal {
    pub currency: String,
    pub amount: Decimal,
}

/// Capital per portfolio within one bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAllocation {
    pub portfolio: String,
    /// BUY minus SELL, in USD.
    pub invested_usd: Decimal,
    /// COMMIT, in USD.
    pub committed_usd: Decimal,
}

/// A pie chart slice: a positive amount and its share of the chart total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub portfolio: String,
    pub amount: Decimal,
    /// Percentage of the sum of all slices in the same chart.
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankBreakdown {
    pub bank: String,
    pub portfolios: Vec<PortfolioAllocation>,
    pub invested: Vec<AllocationSlice>,
    pub committed: Vec<AllocationSlice>,
}

/// Totals over the whole record snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub total_usd: Decimal,
    pub total_local: Decimal,
    pub last_trade_date: Option<NaiveDate>,
    /// Sorted by amount, highest first.
    pub currencies: Vec<CurrencyTotal>,
    /// In order of first appearance in the snapshot.
    pub banks: Vec<BankBreakdown>,
}
