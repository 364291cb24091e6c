// In crates/analytics/src/selection.rs

use core_types::{Ticker, TradeRecord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Label shown for records without a bank or portfolio.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Label shown for records without an asset name.
pub const UNNAMED_LABEL: &str = "Unnamed";

/// The bank / portfolio / asset name chosen in the cascading dropdowns.
///
/// Fields are only reachable through the `select_*` methods so the reset
/// order cannot be bypassed: a new bank clears portfolio and asset name, a new
/// portfolio clears the asset name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    bank: Option<String>,
    portfolio: Option<String>,
    asset_name: Option<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bank(&self) -> Option<&str> {
        self.bank.as_deref()
    }

    pub fn portfolio(&self) -> Option<&str> {
        self.portfolio.as_deref()
    }

    pub fn asset_name(&self) -> Option<&str> {
        self.asset_name.as_deref()
    }

    /// An empty string clears the bank.
    pub fn select_bank(&mut self, bank: &str) {
        self.bank = non_empty(bank);
        self.portfolio = None;
        self.asset_name = None;
    }

    pub fn select_portfolio(&mut self, portfolio: &str) {
        self.portfolio = non_empty(portfolio);
        self.asset_name = None;
    }

    pub fn select_asset_name(&mut self, asset_name: &str) {
        self.asset_name = non_empty(asset_name);
    }

    pub fn is_complete(&self) -> bool {
        self.bank.is_some() && self.portfolio.is_some() && self.asset_name.is_some()
    }

    fn matches_bank(&self, record: &TradeRecord) -> bool {
        self.bank() == Some(record.bank.as_str())
    }

    fn matches_portfolio(&self, record: &TradeRecord) -> bool {
        self.matches_bank(record) && self.portfolio() == Some(record.portfolio.as_str())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn label_or(value: &str, fallback: &str) -> String {
    if value.is_empty() { fallback.to_string() } else { value.to_string() }
}

/// Distinct bank labels in order of first appearance.
pub fn bank_options(records: &[TradeRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| label_or(&r.bank, UNKNOWN_LABEL))
        .unique()
        .collect()
}

/// Distinct portfolio labels of the selected bank; empty until a bank is chosen.
pub fn portfolio_options(records: &[TradeRecord], selection: &FilterSelection) -> Vec<String> {
    if selection.bank().is_none() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| selection.matches_bank(r))
        .map(|r| label_or(&r.portfolio, UNKNOWN_LABEL))
        .unique()
        .collect()
}

/// Distinct asset names of the selected bank and portfolio.
pub fn asset_name_options(records: &[TradeRecord], selection: &FilterSelection) -> Vec<String> {
    if selection.bank().is_none() || selection.portfolio().is_none() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| selection.matches_portfolio(r))
        .map(|r| label_or(&r.asset_name, UNNAMED_LABEL))
        .unique()
        .collect()
}

/// The ticker of the first record matching bank, portfolio and asset name.
pub fn resolve_ticker(records: &[TradeRecord], selection: &FilterSelection) -> Option<Ticker> {
    let asset_name = selection.asset_name()?;
    records
        .iter()
        .find(|r| selection.matches_portfolio(r) && r.asset_name == asset_name)
        .map(|r| r.ticker.clone())
}

/// Records of the resolved ticker within the selected bank and portfolio,
/// sorted by trade date. The sort is stable, so same-day records keep their
/// source order.
pub fn filter_records<'a>(
    records: &'a [TradeRecord],
    selection: &FilterSelection,
) -> Vec<&'a TradeRecord> {
    let Some(ticker) = resolve_ticker(records, selection) else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| r.ticker == ticker && selection.matches_portfolio(r))
        .sorted_by_key(|r| r.trade_date)
        .collect()
}

/// The dropdown contents for the current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub selection: FilterSelection,
    pub ticker: Option<Ticker>,
    pub banks: Vec<String>,
    pub portfolios: Vec<String>,
    pub asset_names: Vec<String>,
}

impl FilterOptions {
    pub fn build(records: &[TradeRecord], selection: &FilterSelection) -> Self {
        Self {
            selection: selection.clone(),
            ticker: resolve_ticker(records, selection),
            banks: bank_options(records),
            portfolios: portfolio_options(records, selection),
            asset_names: asset_name_options(records, selection),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::Direction;
    use rust_decimal::Decimal;

    pub(crate) fn record(
        id: &str,
        bank: &str,
        portfolio: &str,
        name: &str,
        ticker: &str,
        date: &str,
    ) -> TradeRecord {
        TradeRecord {
            trade_id: id.to_string(),
            bank: bank.to_string(),
            portfolio: portfolio.to_string(),
            trade_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            asset_class: "Equity".to_string(),
            ticker: Ticker(ticker.to_string()),
            asset_name: name.to_string(),
            direction: Direction::Buy,
            quantity: Decimal::ONE,
            price_usd: Decimal::ONE,
            trade_amount_usd: Decimal::ONE,
            currency: "USD".to_string(),
            price_local: Decimal::ONE,
            trade_amount_local: Decimal::ONE,
        }
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            record("1", "Alpine", "Growth", "Apple", "AAPL", "2024-03-01"),
            record("2", "Alpine", "Growth", "Apple", "AAPL", "2024-01-15"),
            record("3", "Alpine", "Income", "Nestle", "NESN", "2024-02-01"),
            record("4", "Harbor", "Growth", "Apple", "AAPL", "2024-01-01"),
            record("5", "", "", "", "MSFT", "2024-01-01"),
            record("6", "Alpine", "Growth", "Microsoft", "MSFT", "2024-02-10"),
        ]
    }

    #[test]
    fn test_selecting_bank_clears_portfolio_and_asset() {
        let mut selection = FilterSelection::new();
        selection.select_bank("Alpine");
        selection.select_portfolio("Growth");
        selection.select_asset_name("Apple");
        assert!(selection.is_complete());

        selection.select_bank("Harbor");
        assert_eq!(selection.bank(), Some("Harbor"));
        assert_eq!(selection.portfolio(), None);
        assert_eq!(selection.asset_name(), None);
    }

    #[test]
    fn test_selecting_portfolio_clears_asset_only() {
        let mut selection = FilterSelection::new();
        selection.select_bank("Alpine");
        selection.select_portfolio("Growth");
        selection.select_asset_name("Apple");

        selection.select_portfolio("Income");
        assert_eq!(selection.bank(), Some("Alpine"));
        assert_eq!(selection.portfolio(), Some("Income"));
        assert_eq!(selection.asset_name(), None);

        selection.select_portfolio("");
        assert_eq!(selection.portfolio(), None);
    }

    #[test]
    fn test_option_lists_follow_selection() {
        let records = sample();
        let mut selection = FilterSelection::new();

        assert_eq!(bank_options(&records), vec!["Alpine", "Harbor", "Unknown"]);
        assert!(portfolio_options(&records, &selection).is_empty());

        selection.select_bank("Alpine");
        assert_eq!(portfolio_options(&records, &selection), vec!["Growth", "Income"]);
        assert!(asset_name_options(&records, &selection).is_empty());

        selection.select_portfolio("Growth");
        assert_eq!(asset_name_options(&records, &selection), vec!["Apple", "Microsoft"]);
    }

    #[test]
    fn test_resolve_ticker_requires_full_match() {
        let records = sample();
        let mut selection = FilterSelection::new();
        selection.select_bank("Alpine");
        selection.select_portfolio("Growth");
        assert_eq!(resolve_ticker(&records, &selection), None);

        selection.select_asset_name("Microsoft");
        assert_eq!(resolve_ticker(&records, &selection), Some(Ticker("MSFT".to_string())));

        selection.select_asset_name("Nestle");
        assert_eq!(resolve_ticker(&records, &selection), None);
    }

    #[test]
    fn test_filter_records_is_scoped_and_sorted() {
        let records = sample();
        let mut selection = FilterSelection::new();
        selection.select_bank("Alpine");
        selection.select_portfolio("Growth");
        selection.select_asset_name("Apple");

        let ids: Vec<_> = filter_records(&records, &selection)
            .iter()
            .map(|r| r.trade_id.as_str())
            .collect();
        // Harbor's AAPL trade is excluded by bank.
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_filter_records_empty_without_ticker() {
        let records = sample();
        let mut selection = FilterSelection::new();
        selection.select_bank("Alpine");
        assert!(filter_records(&records, &selection).is_empty());
    }

    #[test]
    fn test_filter_options_snapshot() {
        let records = sample();
        let mut selection = FilterSelection::new();
        selection.select_bank("Harbor");
        selection.select_portfolio("Growth");
        selection.select_asset_name("Apple");

        let options = FilterOptions::build(&records, &selection);
        assert_eq!(options.ticker, Some(Ticker("AAPL".to_string())));
        assert_eq!(options.portfolios, vec!["Growth"]);
        assert_eq!(options.asset_names, vec!["Apple"]);
    }
}
