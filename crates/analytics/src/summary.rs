// In crates/analytics/src/summary.rs

use core_types::{Direction, TradeRecord};
use itertools::Itertools;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{
    AllocationSlice, AssetSummary, BankBreakdown, CurrencyTotal, PortfolioAllocation,
};

const UNKNOWN_BANK: &str = "Unknown Bank";
const UNKNOWN_PORTFOLIO: &str = "Unknown Portfolio";
const UNKNOWN_CURRENCY: &str = "Unknown";

/// Builds the asset summary over the full snapshot.
///
/// Totals add every record's trade amounts regardless of direction. The
/// per-portfolio figures do respect direction: BUY adds to invested capital,
/// SELL removes from it, COMMIT adds to committed capital.
pub fn summarize(records: &[TradeRecord]) -> AssetSummary {
    let mut summary = AssetSummary::default();
    let mut currencies: Vec<CurrencyTotal> = Vec::new();
    let mut banks: Vec<(String, Vec<PortfolioAllocation>)> = Vec::new();

    for record in records {
        summary.total_usd += record.trade_amount_usd;
        summary.total_local += record.trade_amount_local;
        if let Some(date) = record.trade_date {
            if summary.last_trade_date.is_none_or(|last| date > last) {
                summary.last_trade_date = Some(date);
            }
        }

        let currency = label_or(&record.currency, UNKNOWN_CURRENCY);
        match currencies.iter_mut().find(|c| c.currency == currency) {
            Some(total) => total.amount += record.trade_amount_local,
            None => currencies.push(CurrencyTotal {
                currency,
                amount: record.trade_amount_local,
            }),
        }

        let bank = label_or(&record.bank, UNKNOWN_BANK);
        let portfolio = label_or(&record.portfolio, UNKNOWN_PORTFOLIO);
        let bank_index = match banks.iter().position(|(name, _)| *name == bank) {
            Some(index) => index,
            None => {
                banks.push((bank, Vec::new()));
                banks.len() - 1
            }
        };
        let portfolios = &mut banks[bank_index].1;
        let portfolio_index = match portfolios.iter().position(|p| p.portfolio == portfolio) {
            Some(index) => index,
            None => {
                portfolios.push(PortfolioAllocation {
                    portfolio,
                    invested_usd: Decimal::ZERO,
                    committed_usd: Decimal::ZERO,
                });
                portfolios.len() - 1
            }
        };
        let entry = &mut portfolios[portfolio_index];

        match record.direction {
            Direction::Buy => entry.invested_usd += record.trade_amount_usd,
            Direction::Sell => entry.invested_usd -= record.trade_amount_usd,
            Direction::Commit => entry.committed_usd += record.trade_amount_usd,
            Direction::Other(_) => {}
        }
    }

    summary.currencies = currencies
        .into_iter()
        .sorted_by(|a, b| b.amount.cmp(&a.amount))
        .collect();

    summary.banks = banks
        .into_iter()
        .map(|(bank, portfolios)| BankBreakdown {
            invested: slices(&portfolios, |p| p.invested_usd),
            committed: slices(&portfolios, |p| p.committed_usd),
            bank,
            portfolios,
        })
        .collect();

    summary
}

/// Positive amounts only, each with its share of their sum.
fn slices<F>(portfolios: &[PortfolioAllocation], amount: F) -> Vec<AllocationSlice>
where
    F: Fn(&PortfolioAllocation) -> Decimal,
{
    let positive: Vec<(&str, Decimal)> = portfolios
        .iter()
        .map(|p| (p.portfolio.as_str(), amount(p)))
        .filter(|(_, a)| *a > Decimal::ZERO)
        .collect();
    let total: Decimal = positive.iter().map(|(_, a)| *a).sum();

    positive
        .into_iter()
        .map(|(portfolio, amount)| AllocationSlice {
            portfolio: portfolio.to_string(),
            amount,
            share: (amount / total * dec!(100)).round_dp(2),
        })
        .collect()
}

fn label_or(value: &str, fallback: &str) -> String {
    if value.is_empty() { fallback.to_string() } else { value.to_string() }
}
