// In crates/risk/src/lib.rs

pub mod error;
pub mod price_shock;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use price_shock::LinearPriceShock;
pub use types::{FormattedScenario, ReferencePosition, StressScenarioResult, StressSettings};

/// The universal interface for a stress scenario model.
///
/// A `StressModel` takes one reference position and a hypothetical percentage
/// price change and reports what the position would be worth and how much of
/// the original trade amount would be lost.
pub trait StressModel: Sync {
    /// The name of the stress model.
    fn name(&self) -> &'static str;

    /// Projects a single shock onto the position.
    ///
    /// # Arguments
    ///
    /// * `position`: The position the shock is applied to.
    /// * `shock`: A signed percentage, e.g. `-20` for a 20% decline.
    fn project(&self, position: &ReferencePosition, shock: i32) -> StressScenarioResult;

    /// Projects every shock in `shocks`, preserving their order.
    fn project_all(&self, position: &ReferencePosition, shocks: &[i32]) -> Vec<StressScenarioResult> {
        shocks.iter().map(|shock| self.project(position, *shock)).collect()
    }
}
