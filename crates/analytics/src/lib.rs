// In crates/analytics/src/lib.rs

//! Pure, recompute-on-demand analytics over a snapshot of trade records.
//!
//! Nothing in here performs I/O. The `session` module ties the pieces
//! together and is the only place that holds state between calls.

pub mod benchmark;
pub mod performance;
pub mod selection;
pub mod session;
pub mod summary;
pub mod types;

pub use session::{BenchmarkRequest, DashboardSession};
pub use selection::{FilterOptions, FilterSelection};
pub use types::{AssetSummary, BenchmarkPoint, PerformancePoint, PerformanceView};
