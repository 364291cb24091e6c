// In crates/core-types/src/types.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// An instrument ticker as reported by the asset API (e.g., "AAPL").
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(pub String);

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a trade record affects the cumulative position.
///
/// `Buy` and `Commit` are acquisitions, `Sell` is a disposal. Anything else the
/// upstream spreadsheet contains is kept verbatim in `Other` and contributes
/// nothing to aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
    Commit,
    Other(String),
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Commit => "COMMIT",
            Direction::Other(raw) => raw,
        }
    }

    /// +1 for acquisitions, -1 for disposals, `None` for unrecognized directions.
    pub fn sign(&self) -> Option<Decimal> {
        match self {
            Direction::Buy | Direction::Commit => Some(Decimal::ONE),
            Direction::Sell => Some(Decimal::NEGATIVE_ONE),
            Direction::Other(_) => None,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Other(String::new())
    }
}

impl From<&str> for Direction {
    fn from(raw: &str) -> Self {
        match raw {
            "BUY" => Direction::Buy,
            "SELL" => Direction::Sell,
            "COMMIT" => Direction::Commit,
            other => Direction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Direction::from(raw.as_str()))
    }
}

/// A single trade row as served by the asset API.
///
/// The API is fed from user-uploaded spreadsheets, so every field except the
/// identifier tolerates `null` or absence: numbers read as zero, text as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TradeRecord {
    pub trade_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bank: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub portfolio: String,
    /// `None` when the row had no usable date. Such rows never reach an aggregate.
    #[serde(default, with = "trade_date_format")]
    pub trade_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub asset_class: String,
    #[serde(rename = "ASSET_TICKER", default, deserialize_with = "null_as_default")]
    pub ticker: Ticker,
    #[serde(default, deserialize_with = "null_as_default")]
    pub asset_name: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_usd: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trade_amount_usd: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_local: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trade_amount_local: Decimal,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses a trade date, ignoring any time component (`2024-03-15T00:00:00Z`
/// and `2024-03-15 10:30` both read as `2024-03-15`).
pub fn parse_trade_date(value: &str) -> Result<NaiveDate> {
    let date_part = value.trim().split(['T', ' ']).next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|source| Error::InvalidDate {
        value: value.to_string(),
        source,
    })
}

mod trade_date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| super::parse_trade_date(&s).ok()))
    }
}

/// One row of a monthly benchmark price table.
///
/// The feed sends every figure as text; only the adjusted close is read, the
/// other columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    #[serde(rename = "5. adjusted close", default)]
    pub adjusted_close: String,
}

impl BenchmarkEntry {
    pub fn new(adjusted_close: impl Into<String>) -> Self {
        Self {
            adjusted_close: adjusted_close.into(),
        }
    }

    /// The adjusted close as a number, or `None` if the feed sent garbage.
    pub fn adjusted_close(&self) -> Option<Decimal> {
        self.adjusted_close.trim().parse::<Decimal>().ok()
    }
}

/// Monthly benchmark prices keyed by the feed's `YYYY-MM-DD` date string.
pub type BenchmarkTable = BTreeMap<String, BenchmarkEntry>;
