use crate::api::types::ErrorBody;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No HTTP response at all: connect failure, reset, timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The request could not be built: client setup or a malformed MIME type.
    #[error("invalid request: {0}")]
    Request(#[source] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}{}", fmt_detail(.detail))]
    Http { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Build an HTTP error from a status code and the raw response body,
    /// extracting `detail` when the body is a FastAPI error document.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|b| match b.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
            });
        ApiError::Http { status, detail }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server-provided `detail`, when there was one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Short message suitable for showing to a person.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Http { status, .. } => status_message(*status),
            ApiError::Request(e) => format!("Invalid request: {e}"),
            ApiError::Decode(_) | ApiError::Url(_) => SERVER_ERROR_MESSAGE.to_string(),
            ApiError::Io(e) => format!("Local file error: {e}"),
        }
    }
}

fn fmt_detail(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Status-specific text shown for HTTP failures.
pub fn status_message(status: u16) -> String {
    match status {
        404 => "Item not found".to_string(),
        413 => "File too large".to_string(),
        422 => "Invalid file format".to_string(),
        500 => SERVER_ERROR_MESSAGE.to_string(),
        other => format!("Server error: {other}"),
    }
}
