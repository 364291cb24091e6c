// In crates/analytics/src/benchmark.rs

use chrono::{Datelike, NaiveDate};
use core_types::{parse_trade_date, BenchmarkTable};
use rust_decimal::Decimal;

use crate::types::{BenchmarkPoint, PerformancePoint};

/// The adjusted close of the observation closest to `date` within the same
/// calendar month.
///
/// Keys that are not dates and entries whose adjusted close is not a number
/// are skipped. On equal distance the earlier key wins.
pub fn nearest_same_month(date: NaiveDate, table: &BenchmarkTable) -> Option<Decimal> {
    table
        .iter()
        .filter_map(|(key, entry)| {
            let observed = parse_trade_date(key).ok()?;
            if observed.year() != date.year() || observed.month() != date.month() {
                return None;
            }
            let price = entry.adjusted_close()?;
            Some((price, (observed - date).num_days().abs()))
        })
        .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
        .map(|(price, _)| price)
}

/// Aligns a benchmark table to the portfolio curve.
///
/// Each portfolio date gets the nearest same-month observation; dates without
/// one, or whose match is a zero price, are dropped. Matched prices are scaled
/// by `portfolio_start / benchmark_start` so both series share an origin,
/// where the starts are the first portfolio value and the first matched
/// price (1 when a series is empty).
pub fn align(portfolio: &[PerformancePoint], table: &BenchmarkTable) -> Vec<BenchmarkPoint> {
    let matched: Vec<(&PerformancePoint, Decimal)> = portfolio
        .iter()
        .filter_map(|point| {
            nearest_same_month(point.date, table)
                .filter(|price| !price.is_zero())
                .map(|price| (point, price))
        })
        .collect();

    let portfolio_start = portfolio.first().map(|p| p.value).unwrap_or(Decimal::ONE);
    let benchmark_start = matched.first().map(|(_, price)| *price).unwrap_or(Decimal::ONE);

    matched
        .into_iter()
        .map(|(point, price)| BenchmarkPoint {
            date: point.date,
            value: scale(price, portfolio_start, benchmark_start),
            quantity: point.quantity,
            price_per_item: price,
        })
        .collect()
}

/// `value * portfolio_start / benchmark_start`.
pub fn scale(value: Decimal, portfolio_start: Decimal, benchmark_start: Decimal) -> Decimal {
    (value * portfolio_start)
        .checked_div(benchmark_start)
        .unwrap_or(value)
}
