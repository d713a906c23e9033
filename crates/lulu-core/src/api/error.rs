use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Fallback shown to the user when the server gave no `detail`.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be missing or expired")]
    Unauthorized { detail: Option<String> },

    #[error("Access denied: {}", display_detail(.0))]
    AccessDenied(Option<String>),

    #[error("Resource not found: {}", display_detail(.0))]
    NotFound(Option<String>),

    #[error("Request rejected ({status}): {}", display_detail(.detail))]
    Rejected {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {}", display_detail(.detail))]
    ServerError {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// An id or slug that would change the route it is placed in
    #[error("Invalid id or slug: {0:?}")]
    InvalidPathSegment(String),
}

fn display_detail(detail: &Option<String>) -> &str {
    detail.as_deref().unwrap_or("no detail")
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI error body: `detail` is a string for `HTTPException` and a list
/// of `{loc, msg, type}` objects for request validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Detail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

#[derive(Debug, Deserialize)]
struct ValidationIssue {
    msg: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the `detail` message out of an error response body, if any.
    pub fn parse_detail(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail? {
            Detail::Message(message) if !message.trim().is_empty() => Some(message),
            Detail::Message(_) => None,
            Detail::Validation(issues) if !issues.is_empty() => Some(
                issues
                    .into_iter()
                    .map(|issue| issue.msg)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Detail::Validation(_) => None,
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = Self::parse_detail(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized { detail },
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError { status, detail },
            _ => ApiError::Rejected { status, detail },
        }
    }

    /// The server-provided `detail`, when the error came with one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail }
            | ApiError::AccessDenied(detail)
            | ApiError::NotFound(detail)
            | ApiError::Rejected { detail, .. }
            | ApiError::ServerError { detail, .. } => detail.as_deref(),
            ApiError::RateLimited
            | ApiError::NetworkError(_)
            | ApiError::InvalidResponse(_)
            | ApiError::InvalidPathSegment(_) => None,
        }
    }

    /// HTTP status of the failed response; `None` for transport failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::AccessDenied(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::Rejected { status, .. } | ApiError::ServerError { status, .. } => {
                Some(*status)
            }
            ApiError::NetworkError(e) => e.status(),
            ApiError::InvalidResponse(_) | ApiError::InvalidPathSegment(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message suitable for showing to the user: the server's `detail` when
    /// present, the transport error for network failures, otherwise a
    /// generic message.
    pub fn user_message(&self) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_string();
        }
        match self {
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(e) if e.is_connect() => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::NetworkError(e) => e.to_string(),
            ApiError::RateLimited | ApiError::InvalidPathSegment(_) => self.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}
