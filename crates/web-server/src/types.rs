// In crates/web-server/src/types.rs

use risk::{ReferencePosition, StressScenarioResult};
use serde::{Deserialize, Serialize};

/// Body of `PUT /api/selection/*`. An empty value clears the selection level.
#[derive(Debug, Deserialize)]
pub struct SelectionUpdate {
    #[serde(default)]
    pub value: String,
}

/// Query of `GET /api/stress` (e.g., `?custom=-15`).
#[derive(Debug, Deserialize)]
pub struct StressParams {
    pub custom: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResponse {
    pub generation: u64,
    pub custom: i32,
    /// `None` until bank, portfolio and asset are selected.
    pub reference: Option<ReferencePosition>,
    pub scenarios: Vec<StressScenarioResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub generation: u64,
    pub record_count: usize,
}
