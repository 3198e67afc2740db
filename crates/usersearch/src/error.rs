use thiserror::Error;

/// Failure kinds of a search against the GitHub API.
///
/// These carry no display text for end users; see
/// [`crate::presenter::user_message`] for that.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed URL or a non-2xx status that fits no other kind.
    #[error("invalid request")]
    InvalidRequest,

    /// The body could not be decoded or lacks an expected field.
    #[error("invalid response")]
    InvalidResponse,

    /// `x-ratelimit-remaining` reported zero on a failed request.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// HTTP 403.
    #[error("unauthorized")]
    Unauthorized,

    /// The connection could not be established.
    #[error("no internet connection")]
    NoInternet,

    /// Any other transport-level failure (timeouts, resets, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected/internal error (e.g. a panicked enrichment task).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the device is offline.
    #[inline]
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::NoInternet)
    }

    /// Check if this error is a rate limit error.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded)
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
