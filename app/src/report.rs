// In app/src/report.rs

use analytics::{AssetSummary, PerformanceView};
use api_client::UploadSummary;
use itertools::Itertools;
use risk::StressScenarioResult;

/// Renders the asset summary the way the dashboard's summary view lays it out.
pub fn render_summary(summary: &AssetSummary) -> String {
    let mut lines = vec![
        "--- Asset Summary ---".to_string(),
        format!("Total (USD):   {:.2}", summary.total_usd),
        format!("Total (local): {:.2}", summary.total_local),
        format!(
            "Last trade:    {}",
            summary
                .last_trade_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
    ];

    if !summary.currencies.is_empty() {
        lines.push(String::new());
        lines.push("By currency:".to_string());
        for total in &summary.currencies {
            lines.push(format!("  {:<8} {:>16.2}", total.currency, total.amount));
        }
    }

    for bank in &summary.banks {
        lines.push(String::new());
        lines.push(format!("[{}]", bank.bank));
        for allocation in &bank.portfolios {
            lines.push(format!(
                "  {:<24} invested {:>14.2} | committed {:>14.2}",
                allocation.portfolio, allocation.invested_usd, allocation.committed_usd
            ));
        }
        if !bank.invested.is_empty() {
            lines.push(format!(
                "  invested share:  {}",
                bank.invested.iter().map(|s| format!("{} {}%", s.portfolio, s.share)).join(", ")
            ));
        }
        if !bank.committed.is_empty() {
            lines.push(format!(
                "  committed share: {}",
                bank.committed.iter().map(|s| format!("{} {}%", s.portfolio, s.share)).join(", ")
            ));
        }
    }

    lines.join("\n")
}

/// Renders the portfolio curve with the aligned benchmark value per date.
pub fn render_performance(view: &PerformanceView) -> String {
    let ticker = view.ticker.as_ref().map(|t| t.0.as_str()).unwrap_or("-");
    if view.portfolio.is_empty() {
        return format!("No trades for the selection (ticker: {}).", ticker);
    }

    let mut lines = vec![
        format!("--- Performance: {} ---", ticker),
        format!("{:<12} {:>14} {:>12} {:>12} {:>14}", "Date", "Value", "Quantity", "Price", "Benchmark"),
    ];
    for point in &view.portfolio {
        let benchmark = view
            .benchmark
            .iter()
            .find(|b| b.date == point.date)
            .map(|b| format!("{:.2}", b.value))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{:<12} {:>14.2} {:>12} {:>12.2} {:>14}",
            point.date.to_string(),
            point.value,
            point.quantity,
            point.price_per_item,
            benchmark
        ));
    }
    lines.join("\n")
}

/// Renders the stress table.
pub fn render_stress(scenarios: &[StressScenarioResult]) -> String {
    if scenarios.is_empty() {
        return "No reference trade for the selection.".to_string();
    }

    let mut lines = vec![
        "--- Stress Scenarios ---".to_string(),
        format!("{:<8} {:>14} {:>16} {:>16} {:>10}", "Shock", "New price", "New amount", "Loss", "Loss %"),
    ];
    for scenario in scenarios {
        let f = &scenario.formatted;
        lines.push(format!(
            "{:<8} {:>14} {:>16} {:>16} {:>10}",
            scenario.label, f.new_price, f.new_amount, f.absolute_loss, f.percentage_loss
        ));
    }
    lines.join("\n")
}

pub fn render_upload(file_name: &str, summary: &UploadSummary) -> String {
    let mut lines = vec![
        format!("Uploaded {}: {}", file_name, summary.message),
        format!(
            "  total {} | successful {} | failed {}",
            summary.total, summary.successful, summary.failed
        ),
    ];
    for error in &summary.errors {
        lines.push(format!("  ! {}", error));
    }
    lines.join("\n")
}
