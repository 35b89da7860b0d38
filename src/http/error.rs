//! Error returned by a single Dashboard API call.

use reqwest::StatusCode;

/// Failure of one Dashboard API call.
///
/// Carries everything a caller needs to decide whether to retry and to
/// render a diagnostic: the status code and response body for HTTP
/// failures, a message otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    Status { status: StatusCode, body: String },
    /// The request never produced a response (connect, TLS, timeout...).
    Transport(String),
    /// The server answered 2xx but the body could not be decoded.
    Decode(String),
    /// The caller cancelled while waiting between attempts.
    Cancelled,
}

impl ApiError {
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, if the server answered.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body text, if the server answered.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Only 4xx answers are retried. The Dashboard API returns them
    /// spuriously while it is still settling a recent write.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if status.is_client_error())
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Status { status, body } if body.is_empty() => {
                write!(f, "HTTP {}", status.as_u16())
            }
            ApiError::Status { status, body } => {
                write!(f, "HTTP {}: {}", status.as_u16(), body)
            }
            ApiError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ApiError::Decode(msg) => write!(f, "Failed to decode response: {}", msg),
            ApiError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {}
