// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API client error: {0}")]
    CustomError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: status {status}, message: {message}")]
    ApiError { status: u16, message: String },
    #[error("Benchmark feed error: {0}")]
    FeedError(String),
    #[error("Failed to read upload file: {0}")]
    FileError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
