// In crates/app-config/src/types.rs

use serde::Deserialize;

use risk::StressSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    pub server: ServerSettings,
    /// Where trade records are read from and uploads are sent to.
    pub asset_api: AssetApiSettings,
    /// Settings for the monthly benchmark price feed.
    pub benchmark: BenchmarkSettings,
    // The whole section is optional; defaults match the dashboard slider.
    #[serde(default)]
    pub stress: StressSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AssetApiSettings {
    /// Base URL of the asset API; `/assets` and `/assets/upload` are appended.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BenchmarkSettings {
    #[serde(default = "default_benchmark_url")]
    pub base_url: String,
    /// The API key for the price feed.
    pub api_key: String,
    #[serde(default = "default_benchmark_function")]
    pub function: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Helper functions for serde defaults
fn default_timeout_secs() -> u64 { 30 }
fn default_benchmark_url() -> String { "https://www.alphavantage.co/query".to_string() }
fn default_benchmark_function() -> String { "TIME_SERIES_MONTHLY_ADJUSTED".to_string() }
