// In crates/web-server/src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] api_client::Error),

    #[error(transparent)]
    Stress(#[from] risk::Error),

    #[error("Failed to bind server address: {0}")]
    ServerBindError(std::io::Error),

    #[error("Server terminated: {0}")]
    ServerError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Stress(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::ServerBindError(_) | Error::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text the dashboard shows to the user.
    fn message(&self) -> String {
        match self {
            // The asset API's own message is already user-facing.
            Error::Upstream(api_client::Error::ApiError { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self, "Request failed.");
        } else {
            tracing::warn!(error = %self, "Request rejected.");
        }
        (status, Json(serde_json::json!({ "message": self.message() }))).into_response()
    }
}
