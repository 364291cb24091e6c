// In crates/analytics/src/session.rs

use core_types::{BenchmarkTable, Ticker, TradeRecord};
use risk::{LinearPriceShock, ReferencePosition, StressModel, StressScenarioResult, StressSettings};
use std::fmt::Display;
use std::sync::Arc;

use crate::selection::{self, FilterOptions, FilterSelection};
use crate::types::{AssetSummary, BenchmarkPoint, PerformancePoint, PerformanceView};
use crate::{benchmark, performance, summary};

/// A benchmark fetch the caller should perform for the current selection.
///
/// The `generation` must be handed back to [`DashboardSession::apply_benchmark`]
/// so a response that arrives after the selection changed can be recognised
/// and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRequest {
    pub generation: u64,
    pub ticker: Ticker,
}

/// The state behind one dashboard: a read-only record snapshot, the user's
/// filter selection, and the outputs derived from them.
///
/// Every mutation ends in [`recompute`](Self::recompute), which rebuilds the
/// portfolio curve from scratch, clears the benchmark series and bumps the
/// generation counter.
#[derive(Debug)]
pub struct DashboardSession {
    records: Arc<[TradeRecord]>,
    selection: FilterSelection,
    generation: u64,
    performance: Vec<PerformancePoint>,
    benchmark: Vec<BenchmarkPoint>,
    stress_settings: StressSettings,
}

impl DashboardSession {
    pub fn new(records: Arc<[TradeRecord]>, stress_settings: StressSettings) -> Self {
        let mut session = Self {
            records,
            selection: FilterSelection::new(),
            generation: 0,
            performance: Vec::new(),
            benchmark: Vec::new(),
            stress_settings,
        };
        session.recompute();
        session
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stress_settings(&self) -> &StressSettings {
        &self.stress_settings
    }

    /// Swaps in a fresh snapshot, keeping the current selection.
    pub fn replace_records(&mut self, records: Arc<[TradeRecord]>) -> u64 {
        self.records = records;
        self.recompute()
    }

    pub fn select_bank(&mut self, bank: &str) -> u64 {
        self.selection.select_bank(bank);
        self.recompute()
    }

    pub fn select_portfolio(&mut self, portfolio: &str) -> u64 {
        self.selection.select_portfolio(portfolio);
        self.recompute()
    }

    pub fn select_asset_name(&mut self, asset_name: &str) -> u64 {
        self.selection.select_asset_name(asset_name);
        self.recompute()
    }

    /// Rebuilds the derived portfolio curve and invalidates the benchmark.
    pub fn recompute(&mut self) -> u64 {
        self.generation += 1;
        let filtered = selection::filter_records(&self.records, &self.selection);
        self.performance = performance::aggregate(filtered);
        self.benchmark.clear();

        tracing::debug!(
            generation = self.generation,
            points = self.performance.len(),
            "Recomputed portfolio performance."
        );
        self.generation
    }

    pub fn ticker(&self) -> Option<Ticker> {
        selection::resolve_ticker(&self.records, &self.selection)
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::build(&self.records, &self.selection)
    }

    pub fn performance(&self) -> &[PerformancePoint] {
        &self.performance
    }

    pub fn benchmark(&self) -> &[BenchmarkPoint] {
        &self.benchmark
    }

    /// The fetch to issue for the current generation, if bank, portfolio and
    /// asset are all selected, the curve is non-empty and a ticker is resolved.
    pub fn benchmark_request(&self) -> Option<BenchmarkRequest> {
        if !self.selection.is_complete() || self.performance.is_empty() {
            return None;
        }
        let ticker = self.ticker().filter(|t| !t.0.is_empty())?;
        Some(BenchmarkRequest { generation: self.generation, ticker })
    }

    /// Applies a benchmark fetch result issued for `generation`.
    ///
    /// Returns `false` when the result is stale and was discarded. A failed
    /// fetch leaves the benchmark series empty; the portfolio curve is shown
    /// on its own.
    pub fn apply_benchmark<E: Display>(
        &mut self,
        generation: u64,
        result: Result<BenchmarkTable, E>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding stale benchmark response."
            );
            return false;
        }

        match result {
            Ok(table) => {
                self.benchmark = benchmark::align(&self.performance, &table);
                tracing::info!(
                    generation,
                    observations = table.len(),
                    aligned = self.benchmark.len(),
                    "Benchmark aligned to portfolio."
                );
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "Benchmark fetch failed, showing portfolio only.");
                self.benchmark.clear();
            }
        }
        true
    }

    pub fn performance_view(&self) -> PerformanceView {
        PerformanceView {
            generation: self.generation,
            selection: self.selection.clone(),
            ticker: self.ticker(),
            portfolio: self.performance.clone(),
            benchmark: self.benchmark.clone(),
        }
    }

    /// The most recent trade of the filtered set.
    pub fn reference_record(&self) -> Option<&TradeRecord> {
        selection::filter_records(&self.records, &self.selection)
            .last()
            .copied()
    }

    /// The stress table for the reference record, empty when nothing is selected.
    ///
    /// `custom` falls back to the configured default custom shock.
    pub fn stress(&self, custom: Option<i32>) -> risk::Result<Vec<StressScenarioResult>> {
        let custom = custom.unwrap_or(self.stress_settings.default_custom);
        let shocks = self.stress_settings.shock_levels(custom)?;
        let Some(record) = self.reference_record() else {
            return Ok(Vec::new());
        };
        let position = ReferencePosition::from(record);
        let model = LinearPriceShock::new();
        tracing::debug!(
            model = model.name(),
            trade_id = %record.trade_id,
            ?shocks,
            "Projecting stress scenarios."
        );
        Ok(model.project_all(&position, &shocks))
    }

    pub fn summary(&self) -> AssetSummary {
        summary::summarize(&self.records)
    }
}
