// In crates/risk/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Custom shock of {shock}% is outside the allowed range [{min}%, {max}%]")]
    ShockOutOfRange { shock: i32, min: i32, max: i32 },

    #[error("Invalid stress parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, Error>;
