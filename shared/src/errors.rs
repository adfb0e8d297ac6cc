use lambda_http::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while proxying one image.
/// The Display string is what the caller sees in the response body.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error("Invalid url: {url}")]
    InvalidUrl { url: String },

    #[error("Host not allowed: {host}")]
    HostNotAllowed { host: String },

    #[error("Upstream error {}{}", .status.as_u16(), snippet_suffix(.snippet))]
    Upstream { status: StatusCode, snippet: String },

    #[error("Upstream image exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Upstream request timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("Upstream request failed: {0}")]
    Transport(String),
}

fn snippet_suffix(snippet: &str) -> String {
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {}", snippet)
    }
}

impl ProxyError {
    /// HTTP status returned to the caller for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            ProxyError::HostNotAllowed { .. } => StatusCode::FORBIDDEN,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::TooLarge { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout { .. } | ProxyError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True when the failure is on our side of the wire (network, timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, ProxyError::Timeout { .. } | ProxyError::Transport(_))
    }
}

/// Cut an upstream error body down to at most `max_chars` characters
pub fn truncate_snippet(body: &str, max_chars: usize) -> String {
    body.trim().chars().take(max_chars).collect()
}
