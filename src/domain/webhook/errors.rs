//! Webhook error types.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that stop a webhook delivery before it is processed.
///
/// Anything that goes wrong after the signature is accepted is logged and
/// acknowledged instead, so the provider does not redeliver.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing signature header")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl WebhookError {
    /// Maps the error to the HTTP status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            // Signed but unreadable: acknowledge so it is not redelivered.
            WebhookError::ParseError(_) => StatusCode::OK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_are_bad_requests() {
        assert_eq!(WebhookError::InvalidSignature.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(WebhookError::MissingSignature.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_errors_are_acknowledged() {
        assert_eq!(WebhookError::ParseError("eof".into()).status_code(), StatusCode::OK);
        assert_eq!(WebhookError::ParseError("eof".into()).to_string(), "Parse error: eof");
    }
}
