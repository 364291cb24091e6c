// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, AssetApiSettings, BenchmarkSettings, ServerSettings, Settings};

/// Loads the application settings from the `config` directory.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `{config_dir}/base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings_from(config_dir: &str) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&format!("{}/base", config_dir)))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&format!("{}/{}", config_dir, environment)).required(false))
        // 3. Load settings from environment variables (e.g., `APP_BENCHMARK__API_KEY=...`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    finish(settings)
}

/// Deserializes and validates a built configuration.
fn finish(config: Config) -> Result<Settings> {
    let settings: Settings = config.try_deserialize()?;
    settings.stress.validate()?;
    Ok(settings)
}
