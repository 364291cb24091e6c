// In crates/risk/src/price_shock.rs

use crate::types::{FormattedScenario, ReferencePosition, StressScenarioResult};
use crate::StressModel;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Applies a shock as a straight percentage move of the unit price.
///
/// The shocked position keeps its quantity; the loss is measured against the
/// original trade amount rather than against `price * quantity`, so fees or
/// rounding baked into the trade amount show up in the 0% row.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearPriceShock;

impl LinearPriceShock {
    pub fn new() -> Self {
        Self
    }
}

impl StressModel for LinearPriceShock {
    fn name(&self) -> &'static str {
        "LinearPriceShock"
    }

    fn project(&self, position: &ReferencePosition, shock: i32) -> StressScenarioResult {
        let factor = Decimal::ONE + Decimal::from(shock) / dec!(100);
        let new_price = position.price * factor;
        let new_amount = new_price * position.quantity;
        let absolute_loss = position.trade_amount - new_amount;

        let percentage_loss = if position.trade_amount.is_zero() {
            tracing::debug!(shock, "Trade amount is zero, percentage loss is undefined.");
            None
        } else {
            Some(absolute_loss / position.trade_amount * dec!(100))
        };

        StressScenarioResult {
            shock,
            label: shock_label(shock),
            new_price,
            new_amount,
            absolute_loss,
            percentage_loss,
            formatted: FormattedScenario {
                new_price: format_two_decimals(new_price),
                new_amount: format_two_decimals(new_amount),
                absolute_loss: format_two_decimals(absolute_loss),
                percentage_loss: percentage_loss
                    .map(format_two_decimals)
                    .unwrap_or_else(|| "n/a".to_string()),
            },
        }
    }
}

/// "+5%", "0%", "-20%".
pub fn shock_label(shock: i32) -> String {
    if shock > 0 {
        format!("+{}%", shock)
    } else {
        format!("{}%", shock)
    }
}

/// Rounds half away from zero, then pads to exactly two decimals.
pub fn format_two_decimals(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
