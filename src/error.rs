use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{HeaderValue, StatusCode};
use thiserror::Error;

use crate::util::{error_response, passthrough_response};

/// Every way a relay call can fail, mapped onto an HTTP response by `IntoResponse`.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("API Key missing")]
    MissingApiKey,
    /// Inbound body is not a valid prompt request.
    #[error("{0}")]
    InvalidBody(String),
    /// Connect, timeout, or body read failure talking to the upstream.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Upstream 2xx body that is not a Chat Completions response.
    #[error("{0}")]
    Decode(String),
    /// Upstream answered with a non-2xx status; relayed verbatim.
    #[error("upstream returned {status}")]
    Upstream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Upstream { status, .. } => *status,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            RelayError::Upstream {
                content_type, body, ..
            } => passthrough_response(status, content_type, body),
            other => error_response(status, &other.to_string()),
        }
    }
}
