// In crates/analytics/src/performance.rs

use chrono::NaiveDate;
use core_types::TradeRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::types::PerformancePoint;

/// The net effect of all records sharing one trade date.
#[derive(Debug, Default)]
struct Bucket {
    value: Decimal,
    quantity: Decimal,
    price_per_item: Decimal,
}

/// USD amount per unit, zero when the quantity is zero.
pub fn unit_price(amount: Decimal, quantity: Decimal) -> Decimal {
    amount.checked_div(quantity).unwrap_or(Decimal::ZERO)
}

/// Folds trade records into a cumulative position curve.
///
/// Records are bucketed by trade date; records without a date are skipped.
/// BUY and COMMIT add to the bucket, SELL subtracts, anything else still
/// opens a bucket but leaves it at zero. The unit price of a bucket is taken
/// from its last recognised record, and a zero unit price carries the
/// previous point's price forward.
pub fn aggregate<'a, I>(records: I) -> Vec<PerformancePoint>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for record in records {
        let Some(date) = record.trade_date else {
            continue;
        };
        let bucket = buckets.entry(date).or_default();

        let Some(sign) = record.direction.sign() else {
            tracing::trace!(
                trade_id = %record.trade_id,
                direction = %record.direction,
                "Unrecognized direction, record contributes nothing."
            );
            continue;
        };
        bucket.value += sign * record.trade_amount_usd;
        bucket.quantity += sign * record.quantity;
        bucket.price_per_item = unit_price(record.trade_amount_usd, record.quantity);
    }

    let mut cumulative_value = Decimal::ZERO;
    let mut cumulative_quantity = Decimal::ZERO;
    let mut last_price = Decimal::ZERO;

    buckets
        .into_iter()
        .map(|(date, bucket)| {
            cumulative_value += bucket.value;
            cumulative_quantity += bucket.quantity;
            if !bucket.price_per_item.is_zero() {
                last_price = bucket.price_per_item;
            }
            PerformancePoint {
                date,
                value: cumulative_value,
                quantity: cumulative_quantity,
                price_per_item: last_price,
            }
        })
        .collect()
}
