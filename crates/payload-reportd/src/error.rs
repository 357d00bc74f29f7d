//! Error types for the report bot

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum BotError {
    /// Webhook body was not a JSON event envelope
    #[error("invalid request body: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// A `report` argument could not be parsed; the text is also posted back
    #[error("{0}")]
    InvalidArgument(String),

    /// Chat API could not be reached
    #[error("error posting chat message: {0}")]
    Http(#[from] reqwest::Error),

    /// Chat API answered but refused the message
    #[error("chat API rejected message: {0}")]
    Chat(String),
}

pub type BotResult<T> = std::result::Result<T, BotError>;

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        let status = match self {
            BotError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(status = status.as_u16(), error = %self, "request failed");
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let bad = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert_eq!(
            BotError::from(bad).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BotError::InvalidArgument("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BotError::Chat("not_in_channel".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
