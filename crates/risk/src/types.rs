// In crates/risk/src/types.rs

use core_types::TradeRecord;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The single position a stress table is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePosition {
    /// Price per unit in USD.
    pub price: Decimal,
    pub quantity: Decimal,
    /// The trade amount in USD that losses are measured against.
    pub trade_amount: Decimal,
}

impl From<&TradeRecord> for ReferencePosition {
    fn from(record: &TradeRecord) -> Self {
        Self {
            price: record.price_usd,
            quantity: record.quantity,
            trade_amount: record.trade_amount_usd,
        }
    }
}

/// Display strings for a scenario, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedScenario {
    pub new_price: String,
    pub new_amount: String,
    pub absolute_loss: String,
    pub percentage_loss: String,
}

/// The outcome of applying one shock to a `ReferencePosition`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressScenarioResult {
    pub shock: i32,
    /// e.g. "-20%", "0%", "+5%".
    pub label: String,
    pub new_price: Decimal,
    pub new_amount: Decimal,
    pub absolute_loss: Decimal,
    /// `None` when the original trade amount is zero.
    pub percentage_loss: Option<Decimal>,
    pub formatted: FormattedScenario,
}

/// Configuration for the stress scenario table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSettings {
    #[serde(default = "default_shocks")]
    pub default_shocks: Vec<i32>,
    #[serde(default = "default_custom_min")]
    pub custom_min: i32,
    #[serde(default = "default_custom_max")]
    pub custom_max: i32,
    #[serde(default = "default_custom_shock")]
    pub default_custom: i32,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            default_shocks: default_shocks(),
            custom_min: default_custom_min(),
            custom_max: default_custom_max(),
            default_custom: default_custom_shock(),
        }
    }
}

impl StressSettings {
    /// Checks the settings themselves are coherent.
    pub fn validate(&self) -> Result<()> {
        if self.custom_min > self.custom_max {
            return Err(Error::InvalidParameters(format!(
                "custom_min ({}) is greater than custom_max ({})",
                self.custom_min, self.custom_max
            )));
        }
        if self.default_shocks.iter().any(|s| *s <= -100) {
            return Err(Error::InvalidParameters(
                "default shocks must be greater than -100%".to_string(),
            ));
        }
        self.validate_custom(self.default_custom).map(|_| ())
    }

    /// Rejects a custom shock outside `[custom_min, custom_max]`.
    pub fn validate_custom(&self, shock: i32) -> Result<i32> {
        if shock < self.custom_min || shock > self.custom_max {
            return Err(Error::ShockOutOfRange {
                shock,
                min: self.custom_min,
                max: self.custom_max,
            });
        }
        Ok(shock)
    }

    /// The default shocks plus `custom`, deduplicated and sorted ascending.
    pub fn shock_levels(&self, custom: i32) -> Result<Vec<i32>> {
        let custom = self.validate_custom(custom)?;
        Ok(self
            .default_shocks
            .iter()
            .copied()
            .chain(std::iter::once(custom))
            .unique()
            .sorted()
            .collect())
    }
}

/// Helper functions for serde defaults
fn default_shocks() -> Vec<i32> { vec![0, -10, -20, -30] }
fn default_custom_min() -> i32 { -90 }
fn default_custom_max() -> i32 { 0 }
fn default_custom_shock() -> i32 { -10 }
